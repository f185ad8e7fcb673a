//! Types the storefront keeps in the session.

pub mod flash;
pub mod page;
pub mod session;

pub use flash::{Flash, FlashKind};
pub use page::{PageContext, PageSlot};
pub use session::{SessionUser, keys as session_keys};
