use super::{ColumnSpec, EntitySchema};
use crate::model::Entity;

/// Rows without an `ITEM` are the summary and blank rows authors leave
/// beneath the data.
pub static SERVICE_LEVEL: EntitySchema = EntitySchema {
    entity: Entity::ServiceLevel,
    columns: &[
        ColumnSpec::text(0, "SERVICE_GROUP"),
        ColumnSpec::text(1, "PRODUCT_SOURCE"),
        ColumnSpec::text(2, "VALUE_ADD_FLAG"),
        ColumnSpec::text(3, "REASON_CODE"),
        ColumnSpec::text(4, "REASON_DESCRIPTION"),
        ColumnSpec::number(5, "SHORTAGE_QTY"),
        ColumnSpec::number(6, "PROMO_FLAG"),
        ColumnSpec::text(7, "COMMENTS"),
        ColumnSpec::text(8, "STATE"),
        ColumnSpec::text(9, "PLNT"),
        ColumnSpec::key(10, "ITEM"),
        ColumnSpec::text(11, "SOLD_TO_PT"),
        ColumnSpec::text(12, "PURCHASE_ORDER_NO"),
        ColumnSpec::text(13, "SOLD_TO_PARTY"),
        ColumnSpec::text(14, "MATERIAL"),
        ColumnSpec::text(15, "MATERIAL_NUMBER"),
        ColumnSpec::text(16, "CUSTOMER_MATERIAL_NUMBER"),
        ColumnSpec::text(17, "EAN_UPC"),
        ColumnSpec::text(18, "DC_FLAG"),
        ColumnSpec::date(19, "MAT_AV_DT"),
        ColumnSpec::number(20, "ORDER_QUANTITY"),
        ColumnSpec::number(21, "DELIVERED_QTY"),
        ColumnSpec::number(22, "DELIVERED_WEIGHT"),
    ],
};
