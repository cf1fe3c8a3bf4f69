//! Table schemas of the PPS family.

use crate::scalar::ScalarType;
use crate::table::Schema;

/// `Product(id -> name)`.
pub struct ProductSchema;

/// Value columns of [`ProductSchema`].
#[derive(Debug, Clone, Copy)]
pub enum ProductColumn {
    /// Product name.
    Name,
}

impl Schema for ProductSchema {
    type Column = ProductColumn;
    const NAME: &'static str = "product";
    const ID: u16 = 0;
    const KEY: &'static [ScalarType] = &[ScalarType::Int32];
    const VALUE: &'static [ScalarType] = &[ScalarType::FixedText(10)];

    fn column_index(column: ProductColumn) -> usize {
        match column {
            ProductColumn::Name => 0,
        }
    }
}

/// `Part(id -> amount, name)`.
pub struct PartSchema;

/// Value columns of [`PartSchema`].
#[derive(Debug, Clone, Copy)]
pub enum PartColumn {
    /// Stock amount.
    Amount,
    /// Part name.
    Name,
}

impl Schema for PartSchema {
    type Column = PartColumn;
    const NAME: &'static str = "part";
    const ID: u16 = 1;
    const KEY: &'static [ScalarType] = &[ScalarType::Int32];
    const VALUE: &'static [ScalarType] = &[ScalarType::Int64, ScalarType::FixedText(10)];

    fn column_index(column: PartColumn) -> usize {
        match column {
            PartColumn::Amount => 0,
            PartColumn::Name => 1,
        }
    }
}

/// `Supplier(id -> name)`.
pub struct SupplierSchema;

/// Value columns of [`SupplierSchema`].
#[derive(Debug, Clone, Copy)]
pub enum SupplierColumn {
    /// Supplier name.
    Name,
}

impl Schema for SupplierSchema {
    type Column = SupplierColumn;
    const NAME: &'static str = "supplier";
    const ID: u16 = 2;
    const KEY: &'static [ScalarType] = &[ScalarType::Int32];
    const VALUE: &'static [ScalarType] = &[ScalarType::FixedText(10)];

    fn column_index(column: SupplierColumn) -> usize {
        match column {
            SupplierColumn::Name => 0,
        }
    }
}

/// `ProductParts(product_id, slot -> part_id)`, slot in `1..=PARTS_PER_PRODUCT`.
pub struct ProductPartsSchema;

/// Value columns of [`ProductPartsSchema`].
#[derive(Debug, Clone, Copy)]
pub enum ProductPartsColumn {
    /// The part occupying this slot.
    PartId,
}

impl Schema for ProductPartsSchema {
    type Column = ProductPartsColumn;
    const NAME: &'static str = "product_parts";
    const ID: u16 = 3;
    const KEY: &'static [ScalarType] = &[ScalarType::Int32, ScalarType::Int32];
    const VALUE: &'static [ScalarType] = &[ScalarType::Int32];

    fn column_index(column: ProductPartsColumn) -> usize {
        match column {
            ProductPartsColumn::PartId => 0,
        }
    }
}

/// `SupplierParts(supplier_id, slot -> part_id)`, slot in `1..=PARTS_PER_SUPPLIER`.
pub struct SupplierPartsSchema;

/// Value columns of [`SupplierPartsSchema`].
#[derive(Debug, Clone, Copy)]
pub enum SupplierPartsColumn {
    /// The part occupying this slot.
    PartId,
}

impl Schema for SupplierPartsSchema {
    type Column = SupplierPartsColumn;
    const NAME: &'static str = "supplier_parts";
    const ID: u16 = 4;
    const KEY: &'static [ScalarType] = &[ScalarType::Int32, ScalarType::Int32];
    const VALUE: &'static [ScalarType] = &[ScalarType::Int32];

    fn column_index(column: SupplierPartsColumn) -> usize {
        match column {
            SupplierPartsColumn::PartId => 0,
        }
    }
}
