use super::{ColumnSpec, EntitySchema};
use crate::model::Entity;

pub static CUSTOMER: EntitySchema = EntitySchema {
    entity: Entity::Customer,
    columns: &[
        ColumnSpec::text(0, "CUSTOMER"),
        ColumnSpec::text(1, "NAME"),
        ColumnSpec::text(2, "STATE"),
        ColumnSpec::text(3, "FAIR_SHARE"),
        ColumnSpec::text(4, "PALLET_HEI"),
        ColumnSpec::text(5, "LOW_CODE"),
        ColumnSpec::text(6, "STORE_SIZE"),
        ColumnSpec::text(7, "STORE_LEAD"),
        ColumnSpec::text(8, "SALES_ORG"),
        ColumnSpec::text(9, "DISTR_CHANNEL"),
        ColumnSpec::text(10, "DIVISION"),
        ColumnSpec::text(11, "SHIP_CONDITIONS"),
        ColumnSpec::text(12, "DEL_PLANT"),
        ColumnSpec::text(13, "DC"),
        ColumnSpec::text(14, "ORDER_COMB"),
        ColumnSpec::text(15, "MAX_PART_D"),
        ColumnSpec::number(16, "PART_DEL_PER_ITEM"),
    ],
};
