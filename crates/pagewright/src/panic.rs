//! Panic payload formatting.

use std::any::Any;

/// Render a panic payload as a failure reason.
///
/// String payloads are used verbatim. Integer payloads are rendered with
/// `Display`; anything else gets an opaque description.
///
/// # Examples
/// ```
/// use pagewright::panic_message;
///
/// let payload = std::panic::catch_unwind(|| panic!("cart is empty"))
///     .expect_err("closure panics");
/// assert_eq!(panic_message(payload.as_ref()), "cart is empty");
/// ```
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    macro_rules! try_downcast {
        ($($ty:ty),* $(,)?) => {
            $(
                if let Some(value) = payload.downcast_ref::<$ty>() {
                    return value.to_string();
                }
            )*
        };
    }

    try_downcast!(&str, String, i32, u32, i64, u64, usize);
    "step panicked with a non-string payload".to_owned()
}
