//! Vault/target substitution

use scriptorium_core::ChallengeError;

/// Concatenate `vault[t]` for each `t` in `targets`, in order
///
/// # Errors
/// `TargetOutOfRange` for the first index past the end of `vault`.
pub fn derive_key(vault: &[String], targets: &[usize]) -> Result<String, ChallengeError> {
    targets
        .iter()
        .map(|&index| {
            vault
                .get(index)
                .map(String::as_str)
                .ok_or(ChallengeError::TargetOutOfRange {
                    index,
                    len: vault.len(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn picks_tokens_in_target_order() {
        let key = derive_key(&vault(&["A", "B", "C", "D"]), &[3, 0, 2]).unwrap();
        assert_eq!(key, "DAC");
    }

    #[test]
    fn tokens_may_repeat_and_span_characters() {
        let key = derive_key(&vault(&["VO", "YN", "ICH"]), &[0, 1, 1, 2]).unwrap();
        assert_eq!(key, "VOYNYNICH");
    }

    #[test]
    fn empty_targets_yield_empty_key() {
        assert_eq!(derive_key(&vault(&["A"]), &[]).unwrap(), "");
    }

    #[test]
    fn out_of_range_target_is_error() {
        let err = derive_key(&vault(&["A", "B"]), &[1, 2]).unwrap_err();
        assert!(matches!(
            err,
            ChallengeError::TargetOutOfRange { index: 2, len: 2 }
        ));
    }
}
