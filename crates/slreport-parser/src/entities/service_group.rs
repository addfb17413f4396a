use super::{ColumnSpec, EntitySchema};
use crate::model::Entity;

pub static SERVICE_GROUP: EntitySchema = EntitySchema {
    entity: Entity::ServiceGroup,
    columns: &[
        ColumnSpec::text(0, "DEPT"),
        ColumnSpec::text(1, "WOW_MATERIAL_CODE"),
        ColumnSpec::text(2, "MATERIAL_DESCRIPTION"),
        ColumnSpec::text(3, "PRODUCT_SOURCE"),
        ColumnSpec::text(4, "SPECIES"),
        ColumnSpec::text(5, "SERVICE_GROUP"),
    ],
};
