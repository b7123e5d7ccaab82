use serde_json::Value;

use crate::schema::SafeValidate;

/// Uniform check every prompt primitive accepts: `Ok(())` or the text to show inline.
pub type ValidateFn<'a> = dyn Fn(&Value) -> Result<(), String> + Send + Sync + 'a;

pub const ISSUE_SEPARATOR: &str = ",\n";

/// Wraps a node's `safe_validate` so all reported issues surface in one prompt cycle.
pub fn adapter<'a, S>(schema: &'a S) -> Box<ValidateFn<'a>>
where
    S: SafeValidate + Send + Sync + ?Sized,
{
    Box::new(move |value: &Value| match schema.safe_validate(value) {
        Ok(()) => Ok(()),
        Err(issues) => Err(issues
            .iter()
            .map(|issue| issue.message.as_str())
            .collect::<Vec<_>>()
            .join(ISSUE_SEPARATOR)),
    })
}
