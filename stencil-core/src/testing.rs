use crate::{
    AsValue, Entity, EntityDescriptor, Error, PropertyDef, Result, RowLabeled, Value,
};
use log::LevelFilter;
use std::{env, sync::LazyLock};

pub(crate) fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Hand written equivalent of what `#[derive(Entity)]` produces.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Order {
    pub id: i64,
    pub customer: String,
    pub total: f64,
    pub note: Option<String>,
}

impl Entity for Order {
    fn table_name() -> &'static str {
        "orders"
    }

    fn schema_name() -> &'static str {
        "sales"
    }

    fn properties() -> &'static [PropertyDef] {
        static PROPERTIES: [PropertyDef; 4] = [
            PropertyDef {
                name: "id",
                column_name: "order_id",
                order: 0,
                key: true,
                database_generated: true,
            },
            PropertyDef {
                name: "customer",
                column_name: "customer",
                order: 1,
                key: false,
                database_generated: false,
            },
            PropertyDef {
                name: "total",
                column_name: "total",
                order: 2,
                key: false,
                database_generated: false,
            },
            PropertyDef {
                name: "note",
                column_name: "note",
                order: 3,
                key: false,
                database_generated: false,
            },
        ];
        &PROPERTIES
    }

    fn descriptor() -> &'static EntityDescriptor<Self> {
        static DESCRIPTOR: LazyLock<EntityDescriptor<Order>> = LazyLock::new(EntityDescriptor::new);
        &DESCRIPTOR
    }

    fn property_value(&self, property: &str) -> Option<Value> {
        Some(match property {
            "id" => self.id.as_value(),
            "customer" => self.customer.clone().as_value(),
            "total" => self.total.as_value(),
            "note" => self.note.clone().as_value(),
            _ => return None,
        })
    }

    fn set_property_value(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "id" => self.id = AsValue::try_from_value(value)?,
            "customer" => self.customer = AsValue::try_from_value(value)?,
            "total" => self.total = AsValue::try_from_value(value)?,
            "note" => self.note = AsValue::try_from_value(value)?,
            _ => return Err(Error::msg(format!("Order has no property `{}`", property))),
        }
        Ok(())
    }

    fn from_row(mut row: RowLabeled) -> Result<Self> {
        Ok(Self {
            id: AsValue::try_from_value(row.take("id"))?,
            customer: AsValue::try_from_value(row.take("customer"))?,
            total: AsValue::try_from_value(row.take("total"))?,
            note: AsValue::try_from_value(row.take("note"))?,
        })
    }
}

/// Entity without any key.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Customer {
    pub name: String,
}

impl Entity for Customer {
    fn table_name() -> &'static str {
        "customer"
    }

    fn schema_name() -> &'static str {
        ""
    }

    fn properties() -> &'static [PropertyDef] {
        static PROPERTIES: [PropertyDef; 1] = [PropertyDef {
            name: "name",
            column_name: "name",
            order: 0,
            key: false,
            database_generated: false,
        }];
        &PROPERTIES
    }

    fn descriptor() -> &'static EntityDescriptor<Self> {
        static DESCRIPTOR: LazyLock<EntityDescriptor<Customer>> =
            LazyLock::new(EntityDescriptor::new);
        &DESCRIPTOR
    }

    fn property_value(&self, property: &str) -> Option<Value> {
        match property {
            "name" => Some(self.name.clone().as_value()),
            _ => None,
        }
    }

    fn set_property_value(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "name" => self.name = AsValue::try_from_value(value)?,
            _ => return Err(Error::msg(format!("Customer has no property `{}`", property))),
        }
        Ok(())
    }

    fn from_row(mut row: RowLabeled) -> Result<Self> {
        Ok(Self {
            name: AsValue::try_from_value(row.take("name"))?,
        })
    }
}

/// Two properties stored in the same column.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct DuplicateColumns {
    pub a: i32,
    pub b: i32,
}

impl Entity for DuplicateColumns {
    fn table_name() -> &'static str {
        "duplicate_columns"
    }

    fn schema_name() -> &'static str {
        ""
    }

    fn properties() -> &'static [PropertyDef] {
        static PROPERTIES: [PropertyDef; 2] = [
            PropertyDef {
                name: "a",
                column_name: "x",
                order: 0,
                key: false,
                database_generated: false,
            },
            PropertyDef {
                name: "b",
                column_name: "x",
                order: 1,
                key: false,
                database_generated: false,
            },
        ];
        &PROPERTIES
    }

    fn descriptor() -> &'static EntityDescriptor<Self> {
        static DESCRIPTOR: LazyLock<EntityDescriptor<DuplicateColumns>> =
            LazyLock::new(EntityDescriptor::new);
        &DESCRIPTOR
    }

    fn property_value(&self, property: &str) -> Option<Value> {
        match property {
            "a" => Some(self.a.as_value()),
            "b" => Some(self.b.as_value()),
            _ => None,
        }
    }

    fn set_property_value(&mut self, property: &str, value: Value) -> Result<()> {
        match property {
            "a" => self.a = AsValue::try_from_value(value)?,
            "b" => self.b = AsValue::try_from_value(value)?,
            _ => {
                return Err(Error::msg(format!(
                    "DuplicateColumns has no property `{}`",
                    property
                )));
            }
        }
        Ok(())
    }

    fn from_row(mut row: RowLabeled) -> Result<Self> {
        Ok(Self {
            a: AsValue::try_from_value(row.take("a"))?,
            b: AsValue::try_from_value(row.take("b"))?,
        })
    }
}
