//! Database Models

pub mod city;
pub mod order;
pub mod product;
pub mod runner;
pub mod user;

pub use city::{City, CityCreate};
pub use order::{
    NewOrder, NewOrderItem, Order, OrderItem, OrderItemDetail, OrderStatus, OrderWithItems,
};
pub use product::{Product, ProductCreate};
pub use runner::{ActiveRunner, RunnerProfile, RunnerProfileUpdate};
pub use user::{User, UserCreate};
