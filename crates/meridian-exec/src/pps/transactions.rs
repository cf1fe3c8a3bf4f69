//! PPS transaction bodies.

use std::sync::Arc;

use crate::adapter::StorageAdapter;
use crate::scalar::Scalar;
use crate::table::Table;
use crate::txn::{ErrorSlot, TransactionBody};

use super::schema::{
    PartColumn, PartSchema, ProductColumn, ProductPartsColumn, ProductPartsSchema, ProductSchema,
    SupplierPartsColumn, SupplierPartsSchema,
};
use super::{PARTS_PER_PRODUCT, PARTS_PER_SUPPLIER};

/// Reads a product's name.
pub struct GetProduct {
    product: Table<ProductSchema>,
    product_id: i32,
    product_name: Option<Scalar>,
    err: ErrorSlot,
}

impl GetProduct {
    /// Builds the body.
    #[must_use]
    pub fn new(adapter: &Arc<dyn StorageAdapter>, product_id: i32) -> Self {
        Self {
            product: Table::new(Arc::clone(adapter)),
            product_id,
            product_name: None,
            err: ErrorSlot::new(),
        }
    }

    /// The name read, if any.
    #[must_use]
    pub fn product_name(&self) -> Option<&Scalar> {
        self.product_name.as_ref()
    }
}

impl TransactionBody for GetProduct {
    fn read(&mut self) -> bool {
        let res = self
            .product
            .select_columns(&[Scalar::Int32(self.product_id)], &[ProductColumn::Name]);
        match res.into_iter().next() {
            Some(name) => {
                self.product_name = Some(name);
                true
            }
            None => {
                self.err.set(format!(
                    "The product with id {} does not exist",
                    self.product_id
                ));
                false
            }
        }
    }

    fn compute(&mut self) {}

    fn write(&mut self) -> bool {
        true
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Reads a part's name and stock amount.
pub struct GetPart {
    part: Table<PartSchema>,
    part_id: i32,
    part_name: Option<Scalar>,
    part_amount: i64,
    err: ErrorSlot,
}

impl GetPart {
    /// Builds the body.
    #[must_use]
    pub fn new(adapter: &Arc<dyn StorageAdapter>, part_id: i32) -> Self {
        Self {
            part: Table::new(Arc::clone(adapter)),
            part_id,
            part_name: None,
            part_amount: 0,
            err: ErrorSlot::new(),
        }
    }

    /// The amount read.
    #[must_use]
    pub fn part_amount(&self) -> i64 {
        self.part_amount
    }

    /// The name read, if any.
    #[must_use]
    pub fn part_name(&self) -> Option<&Scalar> {
        self.part_name.as_ref()
    }
}

impl TransactionBody for GetPart {
    fn read(&mut self) -> bool {
        let res = self.part.select_columns(
            &[Scalar::Int32(self.part_id)],
            &[PartColumn::Name, PartColumn::Amount],
        );
        if res.len() == 2 {
            self.part_amount = res[1].as_i64();
            self.part_name = Some(res[0].clone());
            true
        } else {
            self.err.set("The part does not exist");
            false
        }
    }

    fn compute(&mut self) {}

    fn write(&mut self) -> bool {
        true
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Decrements the stock of an arbitrary list of parts by one each.
pub struct OrderParts {
    part: Table<PartSchema>,
    parts_ids: Vec<i32>,
    parts_amounts: Vec<i64>,
    new_parts_amounts: Vec<i64>,
    err: ErrorSlot,
}

impl OrderParts {
    /// Builds the body.
    #[must_use]
    pub fn new(adapter: &Arc<dyn StorageAdapter>, parts_ids: Vec<i32>) -> Self {
        let n = parts_ids.len();
        Self {
            part: Table::new(Arc::clone(adapter)),
            parts_ids,
            parts_amounts: vec![0; n],
            new_parts_amounts: vec![0; n],
            err: ErrorSlot::new(),
        }
    }
}

impl TransactionBody for OrderParts {
    fn read(&mut self) -> bool {
        let mut ok = true;
        for (i, &part_id) in self.parts_ids.iter().enumerate() {
            let res = self
                .part
                .select_columns(&[Scalar::Int32(part_id)], &[PartColumn::Amount]);
            match res.first() {
                Some(amount) => self.parts_amounts[i] = amount.as_i64(),
                None => {
                    self.err.set("The part does not exist");
                    ok = false;
                }
            }
        }
        ok
    }

    fn compute(&mut self) {
        for i in 0..self.parts_ids.len() {
            self.new_parts_amounts[i] = self.parts_amounts[i] - 1;
        }
    }

    fn write(&mut self) -> bool {
        let mut ok = true;
        for (i, &part_id) in self.parts_ids.iter().enumerate() {
            if !self.part.update(
                &[Scalar::Int32(part_id)],
                &[PartColumn::Amount],
                &[Scalar::Int64(self.new_parts_amounts[i])],
            ) {
                self.err.set("Cannot update part");
                ok = false;
            }
        }
        ok
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Orders one product: validates the product's slot-to-part mapping and
/// decrements every constituent part's stock by one.
///
/// This is the second phase of the dependent `order_product` transaction;
/// `parts_ids` comes from a preceding [`GetPartsByProduct`].
pub struct OrderProduct {
    part: Table<PartSchema>,
    product_parts: Table<ProductPartsSchema>,
    product_id: i32,
    parts_ids: Vec<i32>,
    parts_amounts: Vec<i64>,
    new_parts_amounts: Vec<i64>,
    err: ErrorSlot,
}

impl OrderProduct {
    /// Builds the body.
    #[must_use]
    pub fn new(adapter: &Arc<dyn StorageAdapter>, product_id: i32, parts_ids: Vec<i32>) -> Self {
        let n = parts_ids.len();
        Self {
            part: Table::new(Arc::clone(adapter)),
            product_parts: Table::new(Arc::clone(adapter)),
            product_id,
            parts_ids,
            parts_amounts: vec![0; n],
            new_parts_amounts: vec![0; n],
            err: ErrorSlot::new(),
        }
    }
}

impl TransactionBody for OrderProduct {
    fn read(&mut self) -> bool {
        if self.parts_ids.len() != PARTS_PER_PRODUCT {
            self.err.set("The number of parts is not correct");
            return false;
        }

        let mut ok = true;
        for i in 0..PARTS_PER_PRODUCT {
            let res = self.product_parts.select_columns(
                &[Scalar::Int32(self.product_id), Scalar::Int32(i as i32 + 1)],
                &[ProductPartsColumn::PartId],
            );
            match res.first() {
                Some(part_id) => {
                    if part_id.as_i32() != self.parts_ids[i] {
                        self.err.set(format!(
                            "The part doesn't correspond to the product ({} != {})",
                            part_id.as_i32(),
                            self.parts_ids[i]
                        ));
                        ok = false;
                    }
                }
                None => {
                    self.err.set("The product-part relationship does not exist");
                    ok = false;
                }
            }
        }
        for (i, &part_id) in self.parts_ids.iter().enumerate() {
            let res = self
                .part
                .select_columns(&[Scalar::Int32(part_id)], &[PartColumn::Amount]);
            match res.first() {
                Some(amount) => self.parts_amounts[i] = amount.as_i64(),
                None => {
                    self.err.set("The part does not exist");
                    ok = false;
                }
            }
        }
        ok
    }

    fn compute(&mut self) {
        for i in 0..self.parts_ids.len() {
            self.new_parts_amounts[i] = self.parts_amounts[i] - 1;
        }
    }

    fn write(&mut self) -> bool {
        let mut ok = true;
        for (i, &part_id) in self.parts_ids.iter().enumerate() {
            if !self.part.update(
                &[Scalar::Int32(part_id)],
                &[PartColumn::Amount],
                &[Scalar::Int64(self.new_parts_amounts[i])],
            ) {
                self.err.set("Cannot update part");
                ok = false;
            }
        }
        ok
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Restocks one supplier: validates the supplier's slot-to-part mapping
/// and increments every supplied part's stock by one.
pub struct SupplierRestock {
    part: Table<PartSchema>,
    supplier_parts: Table<SupplierPartsSchema>,
    supplier_id: i32,
    parts_ids: Vec<i32>,
    parts_amounts: Vec<i64>,
    new_parts_amounts: Vec<i64>,
    err: ErrorSlot,
}

impl SupplierRestock {
    /// Builds the body.
    #[must_use]
    pub fn new(adapter: &Arc<dyn StorageAdapter>, supplier_id: i32, parts_ids: Vec<i32>) -> Self {
        let n = parts_ids.len();
        Self {
            part: Table::new(Arc::clone(adapter)),
            supplier_parts: Table::new(Arc::clone(adapter)),
            supplier_id,
            parts_ids,
            parts_amounts: vec![0; n],
            new_parts_amounts: vec![0; n],
            err: ErrorSlot::new(),
        }
    }
}

impl TransactionBody for SupplierRestock {
    fn read(&mut self) -> bool {
        if self.parts_ids.len() != PARTS_PER_SUPPLIER {
            self.err.set("The number of parts is not correct");
            return false;
        }

        let mut ok = true;
        for i in 0..PARTS_PER_SUPPLIER {
            let res = self.supplier_parts.select_columns(
                &[Scalar::Int32(self.supplier_id), Scalar::Int32(i as i32 + 1)],
                &[SupplierPartsColumn::PartId],
            );
            match res.first() {
                Some(part_id) => {
                    if part_id.as_i32() != self.parts_ids[i] {
                        self.err.set("The part doesn't correspond to the supplier");
                        ok = false;
                    }
                }
                None => {
                    self.err.set("The supplier-part relationship does not exist");
                    ok = false;
                }
            }
        }
        for (i, &part_id) in self.parts_ids.iter().enumerate() {
            let res = self
                .part
                .select_columns(&[Scalar::Int32(part_id)], &[PartColumn::Amount]);
            match res.first() {
                Some(amount) => self.parts_amounts[i] = amount.as_i64(),
                None => {
                    self.err.set("The part does not exist");
                    ok = false;
                }
            }
        }
        ok
    }

    fn compute(&mut self) {
        for i in 0..self.parts_ids.len() {
            self.new_parts_amounts[i] = self.parts_amounts[i] + 1;
        }
    }

    fn write(&mut self) -> bool {
        let mut ok = true;
        for (i, &part_id) in self.parts_ids.iter().enumerate() {
            if !self.part.update(
                &[Scalar::Int32(part_id)],
                &[PartColumn::Amount],
                &[Scalar::Int64(self.new_parts_amounts[i])],
            ) {
                self.err.set("Cannot update part");
                ok = false;
            }
        }
        ok
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Reads all slot-to-part rows of one product.
///
/// First phase of the dependent `order_product`: the part ids it returns
/// feed the second phase.
pub struct GetPartsByProduct {
    product_parts: Table<ProductPartsSchema>,
    product_id: i32,
    parts_ids: Vec<i32>,
    err: ErrorSlot,
}

impl GetPartsByProduct {
    /// Builds the body.
    #[must_use]
    pub fn new(adapter: &Arc<dyn StorageAdapter>, product_id: i32) -> Self {
        Self {
            product_parts: Table::new(Arc::clone(adapter)),
            product_id,
            parts_ids: vec![0; PARTS_PER_PRODUCT],
            err: ErrorSlot::new(),
        }
    }

    /// The part ids read, slot order.
    #[must_use]
    pub fn parts_ids(&self) -> &[i32] {
        &self.parts_ids
    }
}

impl TransactionBody for GetPartsByProduct {
    fn read(&mut self) -> bool {
        let mut ok = true;
        for i in 0..PARTS_PER_PRODUCT {
            let res = self.product_parts.select_columns(
                &[Scalar::Int32(self.product_id), Scalar::Int32(i as i32 + 1)],
                &[ProductPartsColumn::PartId],
            );
            match res.first() {
                Some(part_id) => self.parts_ids[i] = part_id.as_i32(),
                None => {
                    self.err.set("The part does not exist");
                    ok = false;
                }
            }
        }
        ok
    }

    fn compute(&mut self) {}

    fn write(&mut self) -> bool {
        true
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Reads all slot-to-part rows of one supplier.
pub struct GetPartsBySupplier {
    supplier_parts: Table<SupplierPartsSchema>,
    supplier_id: i32,
    parts_ids: Vec<i32>,
    err: ErrorSlot,
}

impl GetPartsBySupplier {
    /// Builds the body.
    #[must_use]
    pub fn new(adapter: &Arc<dyn StorageAdapter>, supplier_id: i32) -> Self {
        Self {
            supplier_parts: Table::new(Arc::clone(adapter)),
            supplier_id,
            parts_ids: vec![0; PARTS_PER_SUPPLIER],
            err: ErrorSlot::new(),
        }
    }

    /// The part ids read, slot order.
    #[must_use]
    pub fn parts_ids(&self) -> &[i32] {
        &self.parts_ids
    }
}

impl TransactionBody for GetPartsBySupplier {
    fn read(&mut self) -> bool {
        let mut ok = true;
        for i in 0..PARTS_PER_SUPPLIER {
            let res = self.supplier_parts.select_columns(
                &[Scalar::Int32(self.supplier_id), Scalar::Int32(i as i32 + 1)],
                &[SupplierPartsColumn::PartId],
            );
            match res.first() {
                Some(part_id) => self.parts_ids[i] = part_id.as_i32(),
                None => {
                    self.err.set("The part does not exist");
                    ok = false;
                }
            }
        }
        ok
    }

    fn compute(&mut self) {}

    fn write(&mut self) -> bool {
        true
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}

/// Swaps the parts in the first and last slots of one product.
pub struct UpdateProductPart {
    product_parts: Table<ProductPartsSchema>,
    product_id: i32,
    part_id_first: i32,
    part_id_last: i32,
    err: ErrorSlot,
}

impl UpdateProductPart {
    /// Builds the body.
    #[must_use]
    pub fn new(adapter: &Arc<dyn StorageAdapter>, product_id: i32) -> Self {
        Self {
            product_parts: Table::new(Arc::clone(adapter)),
            product_id,
            part_id_first: 0,
            part_id_last: 0,
            err: ErrorSlot::new(),
        }
    }
}

impl TransactionBody for UpdateProductPart {
    fn read(&mut self) -> bool {
        let mut ok = true;
        let first = self.product_parts.select_columns(
            &[Scalar::Int32(self.product_id), Scalar::Int32(1)],
            &[ProductPartsColumn::PartId],
        );
        match first.first() {
            Some(part_id) => self.part_id_first = part_id.as_i32(),
            None => {
                self.err.set("Cannot find the first part id");
                ok = false;
            }
        }
        let last = self.product_parts.select_columns(
            &[
                Scalar::Int32(self.product_id),
                Scalar::Int32(PARTS_PER_PRODUCT as i32),
            ],
            &[ProductPartsColumn::PartId],
        );
        match last.first() {
            Some(part_id) => self.part_id_last = part_id.as_i32(),
            None => {
                self.err.set("Cannot find the last part id");
                ok = false;
            }
        }
        ok
    }

    fn compute(&mut self) {}

    fn write(&mut self) -> bool {
        let mut ok = true;
        if !self.product_parts.update(
            &[Scalar::Int32(self.product_id), Scalar::Int32(1)],
            &[ProductPartsColumn::PartId],
            &[Scalar::Int32(self.part_id_last)],
        ) {
            self.err.set("Cannot update the first part id");
            ok = false;
        }
        if !self.product_parts.update(
            &[
                Scalar::Int32(self.product_id),
                Scalar::Int32(PARTS_PER_PRODUCT as i32),
            ],
            &[ProductPartsColumn::PartId],
            &[Scalar::Int32(self.part_id_first)],
        ) {
            self.err.set("Cannot update the last part id");
            ok = false;
        }
        ok
    }

    fn error(&self) -> &str {
        self.err.message()
    }
}
