//! The products/parts/suppliers benchmark family.
//!
//! Five tables (products, parts, suppliers, and the product-to-part and
//! supplier-to-part mappings) and eight transactions, from pure reads to
//! the dependent two-phase `order_product`.

mod executor;
mod load;
pub mod schema;
mod transactions;

pub use executor::PpsExecutor;
pub use load::{load_tables, PpsLoadParams};
pub use transactions::{
    GetPart, GetPartsByProduct, GetPartsBySupplier, GetProduct, OrderParts, OrderProduct,
    SupplierRestock, UpdateProductPart,
};

/// Parts per product; `order_product` updates exactly this many.
pub const PARTS_PER_PRODUCT: usize = 4;

/// Parts per supplier; `supplier_restock` updates exactly this many.
pub const PARTS_PER_SUPPLIER: usize = 10;
