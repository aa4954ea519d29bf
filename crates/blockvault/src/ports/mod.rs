//! # Ports
//!
//! The backend-agnostic contracts: [`device::BlockDevice`] for opened
//! handles and [`factory::BlockDeviceFactory`] for constructor-side
//! operations. Backends implement both; callers depend on nothing else.

pub mod device;
pub mod factory;
