use super::{ColumnSpec, EntitySchema};
use crate::model::Entity;

pub static MASTER_DATA: EntitySchema = EntitySchema {
    entity: Entity::MasterData,
    columns: &[
        ColumnSpec::text(3, "WOW_MATERIAL_CODE"),
        ColumnSpec::text(4, "MATERIAL_DESCRIPTION"),
        ColumnSpec::text(5, "PRODUCT_SOURCE"),
        ColumnSpec::text(6, "VALUE_ADD_FLAG"),
    ],
};
