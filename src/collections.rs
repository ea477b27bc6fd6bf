//! Collection names used by the warehouse dashboard.
//!
//! The store does not validate these or their record shapes; they exist so
//! call sites do not repeat string literals.

pub const WAREHOUSES: &str = "warehouses";
pub const INVENTORY: &str = "inventory";
pub const VEHICLES: &str = "vehicles";
pub const MATERIAL_REQUESTS: &str = "material_requests";
pub const USERS: &str = "users";
pub const MOVEMENTS: &str = "movements";
pub const PURCHASE_ORDERS: &str = "purchase_orders";

/// Every known collection.
pub const ALL: [&str; 7] = [
    WAREHOUSES,
    INVENTORY,
    VEHICLES,
    MATERIAL_REQUESTS,
    USERS,
    MOVEMENTS,
    PURCHASE_ORDERS,
];
