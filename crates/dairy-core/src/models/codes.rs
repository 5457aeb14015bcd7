//! Sequential human-facing codes.
//!
//! BMC and MPP codes are five digit, zero padded numbers that increase from a
//! fixed starting point. User codes are the upper-case role initial followed
//! by a sequence number padded to at least three digits (`F001`, `S014`,
//! `F1000`).

use super::user::Role;

/// Code assigned to the first BMC.
pub const BMC_FIRST_CODE: &str = "02001";

/// Code assigned to the first MPP.
pub const MPP_FIRST_CODE: &str = "05001";

/// Next BMC/MPP code after the highest existing one.
///
/// Codes that are not numeric are ignored.
pub fn next_entity_code<'a>(existing: impl IntoIterator<Item = &'a str>, first: &str) -> String {
    existing
        .into_iter()
        .filter_map(|code| code.parse::<u64>().ok())
        .max()
        .map(|last| format!("{:05}", last + 1))
        .unwrap_or_else(|| first.to_string())
}

/// Next user code for `role` given the codes already issued.
///
/// Only codes of the form `<prefix><3 or more digits>` for the same prefix
/// count.
pub fn next_user_code<'a>(role: Role, existing: impl IntoIterator<Item = &'a str>) -> String {
    let prefix = role.code_prefix();
    let next = existing
        .into_iter()
        .filter_map(|code| {
            let rest = code.strip_prefix(prefix)?;
            (rest.len() >= 3 && rest.bytes().all(|b| b.is_ascii_digit()))
                .then(|| rest.parse::<u64>().ok())
                .flatten()
        })
        .max()
        .map_or(1, |last| last + 1);
    format!("{prefix}{next:03}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_entity_code() {
        assert_eq!(next_entity_code(Vec::<&str>::new(), BMC_FIRST_CODE), "02001");
        assert_eq!(next_entity_code(Vec::<&str>::new(), MPP_FIRST_CODE), "05001");
    }

    #[test]
    fn test_entity_code_increments_highest() {
        let codes = ["02001", "02007", "02003"];
        assert_eq!(next_entity_code(codes, BMC_FIRST_CODE), "02008");
    }

    #[test]
    fn test_entity_code_skips_garbage() {
        let codes = ["abc", "05002"];
        assert_eq!(next_entity_code(codes, MPP_FIRST_CODE), "05003");
    }

    #[test]
    fn test_user_code_sequence() {
        assert_eq!(next_user_code(Role::Farmer, Vec::<&str>::new()), "F001");
        assert_eq!(next_user_code(Role::Farmer, ["F001", "F009", "S020"]), "F010");
        assert_eq!(next_user_code(Role::Sahayak, ["F001", "S020"]), "S021");
    }

    #[test]
    fn test_user_code_ignores_malformed() {
        assert_eq!(next_user_code(Role::Incharge, ["I12", "I", "Ixyz", "I12a"]), "I001");
    }

    #[test]
    fn test_user_code_grows_past_three_digits() {
        assert_eq!(next_user_code(Role::Farmer, ["F998", "F999"]), "F1000");
        assert_eq!(next_user_code(Role::Farmer, ["F999", "F1000"]), "F1001");
    }

    #[test]
    fn test_user_codes_stay_unique_over_many_accounts() {
        let mut issued: Vec<String> = Vec::new();
        for _ in 0..1_005 {
            let code = next_user_code(Role::Farmer, issued.iter().map(String::as_str));
            assert!(!issued.contains(&code), "duplicate user code {code}");
            issued.push(code);
        }
        assert_eq!(issued.last().map(String::as_str), Some("F1005"));
    }
}
