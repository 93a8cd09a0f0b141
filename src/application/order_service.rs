use std::collections::HashMap;
use std::sync::Arc;

use log::info;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{NewOrder, Order, OrderItem, OrderStatus, PlaceOrder};
use crate::domain::ports::{Collection, MedicineCatalog, OrderStore, PharmacyDirectory};

#[derive(Clone)]
pub struct OrderService {
    orders: Arc<dyn OrderStore>,
    catalog: Arc<dyn MedicineCatalog>,
    directory: Arc<dyn PharmacyDirectory>,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        catalog: Arc<dyn MedicineCatalog>,
        directory: Arc<dyn PharmacyDirectory>,
    ) -> Self {
        Self {
            orders,
            catalog,
            directory,
        }
    }

    /// Prices every line from the pharmacy's catalog and stores a pending order.
    pub async fn place_order(
        &self,
        pharmacy_id: Uuid,
        request: PlaceOrder,
    ) -> Result<Order, DomainError> {
        self.directory
            .find(pharmacy_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("pharmacy {}", pharmacy_id)))?
            .ensure_open()?;
        if request.lines.is_empty() {
            return Err(DomainError::InvalidInput(
                "an order needs at least one item".to_string(),
            ));
        }

        // Repeated medicines collapse into one line, first occurrence keeps its place.
        let mut quantities: Vec<(Uuid, i32)> = Vec::with_capacity(request.lines.len());
        let mut index: HashMap<Uuid, usize> = HashMap::new();
        for line in &request.lines {
            if line.quantity <= 0 {
                return Err(DomainError::InvalidInput(format!(
                    "quantity for medicine {} must be positive",
                    line.medicine_id
                )));
            }
            match index.get(&line.medicine_id) {
                Some(&i) => {
                    let merged = quantities[i].1.checked_add(line.quantity);
                    quantities[i].1 = merged.ok_or_else(|| {
                        DomainError::InvalidInput(format!(
                            "quantity for medicine {} is too large",
                            line.medicine_id
                        ))
                    })?;
                }
                None => {
                    index.insert(line.medicine_id, quantities.len());
                    quantities.push((line.medicine_id, line.quantity));
                }
            }
        }

        let mut items = Vec::with_capacity(quantities.len());
        for (medicine_id, quantity) in quantities {
            let medicine = self
                .catalog
                .find(pharmacy_id, medicine_id)
                .await?
                .filter(|m| m.available)
                .ok_or_else(|| {
                    DomainError::InvalidInput(format!(
                        "medicine {} is not available at this pharmacy",
                        medicine_id
                    ))
                })?;
            items.push(OrderItem::new(medicine.name, medicine.unit_price, quantity)?);
        }

        let order = self
            .orders
            .create(NewOrder {
                pharmacy_id,
                client_id: request.client_id,
                client_label: request.client_label,
                items,
            })
            .await?;
        info!(
            "Order {} placed at pharmacy {} for {}",
            order.id, pharmacy_id, order.total_price
        );
        Ok(order)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Option<Order>, DomainError> {
        self.orders.find(Collection::Global, id).await
    }

    pub async fn list_pharmacy_orders(
        &self,
        pharmacy_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, DomainError> {
        self.orders.list_for_pharmacy(pharmacy_id, status).await
    }

    pub async fn list_client_orders(&self, client_id: Uuid) -> Result<Vec<Order>, DomainError> {
        self.orders.list_for_client(client_id).await
    }
}
