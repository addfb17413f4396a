use super::{ColumnSpec, EntitySchema};
use crate::model::Entity;

pub static FORECAST: EntitySchema = EntitySchema {
    entity: Entity::Forecast,
    columns: &[
        ColumnSpec::number(0, "PROMO_FLAG"),
        ColumnSpec::text(1, "PRODUCT_SOURCE"),
        ColumnSpec::text(2, "PLANT"),
        ColumnSpec::key(3, "MATERIAL_NUMBER"),
        ColumnSpec::text(4, "WOWNR"),
        ColumnSpec::text(5, "DESCRIPTION"),
        ColumnSpec::text(6, "PLANT_MATERIAL_STATUS"),
        ColumnSpec::date(7, "DATE"),
        ColumnSpec::number(8, "FORECAST"),
        ColumnSpec::number(9, "ACTUAL_SALES"),
        ColumnSpec::number(10, "ACTUAL_TPRP"),
        ColumnSpec::number(11, "LAST_OLD_TPRP"),
        ColumnSpec::number(12, "_1_WEEK_OLD_FORECAST"),
        ColumnSpec::number(13, "_2_WEEKS_OLD_FORECAST"),
        ColumnSpec::number(14, "_3_WEEKS_OLD_FORECAST"),
        ColumnSpec::number(15, "_4_WEEKS_OLD_FORECAST"),
        ColumnSpec::number(16, "_5_WEEKS_OLD_FORECAST"),
        ColumnSpec::number(17, "_1_WEEK_OLD_TPRP"),
        ColumnSpec::number(18, "_2_WEEKS_OLD_TPRP"),
        ColumnSpec::number(19, "_3_WEEKS_OLD_TPRP"),
        ColumnSpec::number(20, "_4_WEEKS_OLD_TPRP"),
        ColumnSpec::number(21, "_5_WEEKS_OLD_TPRP"),
    ],
};
