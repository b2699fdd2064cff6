// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod collection;
pub mod model;
pub mod search;
pub mod state;
pub mod summary;

pub use collection::*;
pub use model::*;
pub use search::*;
pub use state::*;
pub use summary::*;
