// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod capabilities;
pub mod cells;
pub mod checkout;
pub mod controller;
pub mod error;
pub mod export;
pub mod ids;
pub mod model;
pub mod selection;
pub mod table;

pub use capabilities::*;
pub use cells::*;
pub use checkout::*;
pub use controller::*;
pub use error::*;
pub use export::*;
pub use ids::*;
pub use model::*;
pub use selection::*;
pub use table::*;
