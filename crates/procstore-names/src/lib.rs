//! Display-name masking and collision-free name allocation.
//!
//! A record name may carry a numeric suffix after [`TAG_SEPARATOR`]
//! (`"seven!2"`). Adding that suffix is *masking*; splitting it off again is
//! *de-masking*. The [`NameAllocator`] hands out masked variants so that no
//! two records saved into one namespace share a file name.

pub mod allocator;
pub mod error;
pub mod mask;

pub use allocator::{Allocation, NameAllocator};
pub use error::{NameError, NameResult};
pub use mask::{mask, parse_name, NameHint, TAG_SEPARATOR};
