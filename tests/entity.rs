mod common;

#[cfg(test)]
mod tests {
    use crate::common::Order;
    use rust_decimal::Decimal;
    use stencil::{
        AsValue, Entity, EntityMapping, EntityMappingBuilder, PropertyDef, RowLabeled, Value,
    };
    use time::{
        Date, PrimitiveDateTime,
        macros::{date, datetime},
    };
    use uuid::Uuid;

    #[test]
    fn discovers_the_entity_shape() {
        assert_eq!(Order::table_name(), "orders");
        assert_eq!(Order::schema_name(), "sales");
        assert_eq!(
            Order::properties(),
            [
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
            ]
        );
    }

    #[test]
    fn default_names_and_order() {
        #[derive(Entity, Default)]
        struct ProductLine {
            _id: u32,
            #[stencil(order = -1)]
            code: String,
            label: Option<String>,
        }
        assert_eq!(ProductLine::table_name(), "product_line");
        assert_eq!(ProductLine::schema_name(), "");
        let columns: Vec<_> = ProductLine::properties()
            .iter()
            .map(|v| (v.name, v.column_name, v.order))
            .collect();
        assert_eq!(
            columns,
            [("_id", "id", 0), ("code", "code", -1), ("label", "label", 2)]
        );

        let mapping: EntityMapping = EntityMappingBuilder::auto_generated::<ProductLine>()
            .freeze()
            .unwrap();
        let names: Vec<_> = mapping.properties().iter().map(|v| v.name()).collect();
        assert_eq!(names, ["code", "_id", "label"]);
        assert!(mapping.key_properties().next().is_none());
        let entity = ProductLine {
            _id: 1,
            code: "A".into(),
            label: None,
        };
        assert_eq!(entity.property_value("_id"), Some(Value::UInt32(Some(1))));
        assert_eq!(entity.property_value("label"), Some(Value::Varchar(None)));
    }

    #[test]
    fn skipped_fields_are_not_mapped() {
        assert!(Order::properties().iter().all(|v| v.name != "dirty"));
        let order = Order {
            dirty: true,
            ..Default::default()
        };
        assert_eq!(order.property_value("dirty"), None);
        assert_eq!(order.property_value("missing"), None);
    }

    #[test]
    fn property_values_round_trip() {
        let mut order = Order {
            id: 7,
            customer: "ACME".into(),
            total: Decimal::new(1250, 2),
            note: Some("fragile".into()),
            dirty: false,
        };
        assert_eq!(order.property_value("id"), Some(Value::Int64(Some(7))));
        assert_eq!(
            order.property_value("total"),
            Some(Decimal::new(1250, 2).as_value())
        );
        order.set_property_value("id", Value::Int32(Some(9))).unwrap();
        order.set_property_value("note", Value::Null).unwrap();
        assert_eq!(order.id, 9);
        assert_eq!(order.note, None);
        assert!(order.set_property_value("dirty", true.into()).is_err());
        assert!(
            order
                .set_property_value("customer", Value::Int64(Some(1)))
                .is_err()
        );
    }

    #[test]
    fn decodes_rows_labeled_by_property() {
        let row = RowLabeled::from([
            ("id", Value::Int64(Some(3))),
            ("customer", "Initech".into()),
            ("total", Decimal::new(5, 0).into()),
        ]);
        let order = Order::from_row(row).unwrap();
        assert_eq!(
            order,
            Order {
                id: 3,
                customer: "Initech".into(),
                total: Decimal::new(5, 0),
                note: None,
                dirty: false,
            }
        );

        let row = RowLabeled::from([("id", Value::Int64(Some(3)))]);
        let error = Order::from_row(row).unwrap_err();
        assert!(
            format!("{:#}", error).contains("While decoding property `customer` of `Order`"),
            "{:#}",
            error
        );
    }

    #[test]
    fn temporal_and_uuid_properties() {
        #[derive(Entity, Debug, PartialEq)]
        #[stencil(schema = "audit")]
        struct LoginEvent {
            #[stencil(key)]
            id: Uuid,
            day: Date,
            at: Option<PrimitiveDateTime>,
        }
        assert_eq!(LoginEvent::table_name(), "login_event");
        assert_eq!(LoginEvent::schema_name(), "audit");
        let id = Uuid::from_u128(0x6f1a_0c2e_8b7d_4d52_a3f1_93c4_2b6e_0d11);
        let row = RowLabeled::from([
            ("id", Value::Varchar(Some(id.to_string()))),
            ("day", Value::Varchar(Some("2025-03-14".into()))),
            ("at", Value::Timestamp(Some(datetime!(2025-03-14 08:30:00)))),
        ]);
        let event = LoginEvent::from_row(row).unwrap();
        assert_eq!(
            event,
            LoginEvent {
                id,
                day: date!(2025 - 03 - 14),
                at: Some(datetime!(2025-03-14 08:30:00)),
            }
        );
        assert_eq!(event.property_value("id"), Some(Value::Uuid(Some(id))));
    }
}
