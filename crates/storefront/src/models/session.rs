//! Session-related types.
//!
//! The cart lives in the tower-sessions record. Handlers load it, mutate the
//! value and save it back explicitly; nothing observes it implicitly.

use tower_sessions::Session;
use tower_sessions::session::Error as SessionError;
use vitrine_core::Cart;

/// Session keys.
pub mod keys {
    /// Key for the serialized session cart.
    pub const CART: &str = "cart";
}

/// Load the session cart, or an empty cart if none was saved.
///
/// # Errors
///
/// Returns an error if the session store fails or the stored cart cannot be
/// deserialized.
pub async fn load_cart(session: &Session) -> Result<Cart, SessionError> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

/// Save the cart to the session. An empty cart removes the key.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn save_cart(session: &Session, cart: &Cart) -> Result<(), SessionError> {
    if cart.is_empty() {
        session.remove::<Cart>(keys::CART).await?;
        return Ok(());
    }
    session.insert(keys::CART, cart).await
}
