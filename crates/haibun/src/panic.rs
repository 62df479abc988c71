//! Helpers for rendering panic payloads raised by step actions.

use std::any::Any;

/// Extract a panic payload into a human-readable message.
///
/// Common primitives are downcast directly; anything else is described by
/// its type id.
///
/// # Examples
/// ```
/// use haibun::panic_message;
///
/// let err = std::panic::catch_unwind(|| panic!("boom")).err();
/// let message = err.as_deref().map(panic_message);
/// assert_eq!(message.as_deref(), Some("boom"));
/// ```
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    macro_rules! try_downcast {
        ($($ty:ty),* $(,)?) => {
            $(
                if let Some(val) = payload.downcast_ref::<$ty>() {
                    return val.to_string();
                }
            )*
        };
    }

    try_downcast!(&str, String, i32, u32, i64, u64, isize, usize, f32, f64);
    format!("opaque panic payload (TypeId({:?}))", payload.type_id())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_common_payloads() {
        let text: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(text.as_ref()), "owned");
        let number: Box<dyn Any + Send> = Box::new(7_u64);
        assert_eq!(panic_message(number.as_ref()), "7");
    }

    #[test]
    fn describes_opaque_payloads() {
        struct Opaque;
        let payload: Box<dyn Any + Send> = Box::new(Opaque);
        assert!(panic_message(payload.as_ref()).starts_with("opaque panic payload"));
    }
}
