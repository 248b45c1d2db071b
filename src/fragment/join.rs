//! Joining a filled slot sequence back into the original payload.

use super::JoinError;

/// Concatenate `slots` in index order.
///
/// # Errors
///
/// Returns [`JoinError::IncompleteFragmentSet`] naming the first empty slot
/// when any slot is still `None`.
///
/// # Examples
///
/// ```
/// use chatframe::fragment::join;
///
/// let slots = [Some("ab"), Some("cd"), Some("e")];
/// assert_eq!(join(&slots).expect("complete set"), "abcde");
/// assert!(join(&[Some("ab"), None]).is_err());
/// ```
pub fn join<S: AsRef<str>>(slots: &[Option<S>]) -> Result<String, JoinError> {
    let mut capacity = 0;
    for (index, slot) in slots.iter().enumerate() {
        let Some(body) = slot else {
            return Err(JoinError::IncompleteFragmentSet {
                missing: index,
                total: slots.len(),
            });
        };
        capacity += body.as_ref().len();
    }

    let mut joined = String::with_capacity(capacity);
    for body in slots.iter().flatten() {
        joined.push_str(body.as_ref());
    }
    Ok(joined)
}
