//! Screening of free text for personally identifiable information.
//!
//! An ordered pipeline of named stages runs over the text as mutated by the
//! stages before it: phone numbers and resident registration numbers are
//! masked, emails/addresses/medical terms only add warnings. The pipeline
//! never fails and is idempotent on already-masked text.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const TYPE_PHONE: &str = "전화번호";
pub const TYPE_RESIDENT_ID: &str = "주민등록번호";
pub const TYPE_EMAIL: &str = "이메일";
pub const TYPE_ADDRESS: &str = "주소";
pub const TYPE_MEDICAL: &str = "의료정보";

const WARN_PHONE: &str = "전화번호가 감지되어 마스킹 처리되었습니다.";
const WARN_RESIDENT_ID: &str =
    "⚠️ 주민등록번호는 입력하지 말아주세요. 보안을 위해 마스킹 처리되었습니다.";
const WARN_EMAIL: &str = "이메일 주소는 상담 폼을 통해 안전하게 전달해주세요.";
const WARN_ADDRESS: &str = "상세 주소는 상담 폼을 통해 안전하게 전달해주세요.";
const WARN_MEDICAL: &str = "구체적인 의료 정보는 담당 간호사나 의사와 상담해주세요.";

const RESIDENT_ID_MASK: &str = "******-*******";
const PHONE_MASK_TOKEN: &str = "-****-";

/// Input-box guidance shown next to the chat widget.
pub const SAFETY_MESSAGE: &str = "💡 주민번호, 상세 주소, 구체적 진단명 등 민감정보는 입력하지 말아주세요.\n상담이 필요하신 경우 전화 또는 상담 폼을 이용해주세요.";

static PHONE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // 010-1234-5678, 02-123-4567, with or without separators.
        Regex::new(r"\d{2,3}-?\d{3,4}-?\d{4}").expect("phone pattern is a valid literal"),
        // 01012345678
        Regex::new(r"\d{3}\d{4}\d{4}").expect("phone pattern is a valid literal"),
    ]
});

// Six date digits, a gender digit 1-4, six more digits.
static RESIDENT_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\d{6}-?[1-4]\d{6}").expect("resident id pattern is a valid literal")
});

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}")
        .expect("email pattern is a valid literal")
});

// "XX시 XX구", "XX구 XX동" style region+district pairs.
static ADDRESS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[가-힣]+[시구동]\s*[가-힣]+[구동로길]").expect("address pattern is a valid literal")
});

const ADDRESS_KEYWORDS: &[&str] = &["시", "구", "동", "번지", "아파트", "호", "번길"];

const MEDICAL_KEYWORDS: &[&str] = &[
    "진단", "병명", "질환", "질병", "암", "당뇨", "고혈압", "치매", "뇌졸중", "파킨슨",
    "알츠하이머", "약", "처방", "투약", "복용",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PiiReport {
    pub has_pii: bool,
    pub masked_text: String,
    pub warnings: Vec<String>,
    pub detected_types: Vec<String>,
}

/// Runs the full detection/masking pipeline. Never fails; text without PII
/// comes back unchanged.
#[must_use]
pub fn check(text: &str) -> PiiReport {
    let mut warnings = Vec::new();
    let mut detected_types = Vec::new();

    let (masked, phone_detected) = mask_phone_numbers(text);
    let mut masked_text = masked;
    if phone_detected {
        detected_types.push(TYPE_PHONE.to_string());
        warnings.push(WARN_PHONE.to_string());
    }

    let (masked, resident_detected) = mask_resident_ids(&masked_text);
    masked_text = masked;
    if resident_detected {
        detected_types.push(TYPE_RESIDENT_ID.to_string());
        warnings.push(WARN_RESIDENT_ID.to_string());
    }

    if detect_email(&masked_text) {
        detected_types.push(TYPE_EMAIL.to_string());
        warnings.push(WARN_EMAIL.to_string());
    }
    if detect_address(&masked_text) {
        detected_types.push(TYPE_ADDRESS.to_string());
        warnings.push(WARN_ADDRESS.to_string());
    }
    if detect_medical_terms(&masked_text) {
        detected_types.push(TYPE_MEDICAL.to_string());
        warnings.push(WARN_MEDICAL.to_string());
    }

    PiiReport {
        has_pii: !detected_types.is_empty(),
        masked_text,
        warnings,
        detected_types,
    }
}

/// Formats warnings into the advisory appended to an assistant reply.
/// Empty input yields an empty string.
#[must_use]
pub fn format_warnings(warnings: &[String]) -> String {
    if warnings.is_empty() {
        return String::new();
    }
    let bullets = warnings
        .iter()
        .map(|warning| format!("• {warning}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n\n⚠️ 보안 안내:\n{bullets}")
}

/// Masks phone-shaped digit groups to first three + last four digits.
fn mask_phone_numbers(text: &str) -> (String, bool) {
    let mut masked = text.to_string();
    let mut detected = false;
    for pattern in PHONE_PATTERNS.iter() {
        let (next, hit) = replace_digit_bounded(pattern, &masked, mask_phone_match);
        masked = next;
        detected |= hit;
    }
    (masked, detected)
}

fn mask_phone_match(raw: &str) -> String {
    // First three and last four of the digit string, separators ignored.
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let head: String = digits.chars().take(3).collect();
    let tail: String = digits
        .chars()
        .skip(digits.chars().count().saturating_sub(4))
        .collect();
    format!("{head}{PHONE_MASK_TOKEN}{tail}")
}

/// Fully replaces resident registration numbers with a fixed placeholder.
fn mask_resident_ids(text: &str) -> (String, bool) {
    replace_digit_bounded(&RESIDENT_ID_PATTERN, text, |_| RESIDENT_ID_MASK.to_string())
}

/// Replaces matches that are not embedded in a longer digit run. The guard
/// keeps the phone stage from consuming the first eleven digits of a
/// thirteen-digit resident registration number.
fn replace_digit_bounded(
    pattern: &Regex,
    text: &str,
    mask: impl Fn(&str) -> String,
) -> (String, bool) {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    let mut detected = false;

    for found in pattern.find_iter(text) {
        let before_ok = text[..found.start()]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_ascii_digit());
        let after_ok = text[found.end()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_digit());
        if !(before_ok && after_ok) {
            continue;
        }
        detected = true;
        out.push_str(&text[last..found.start()]);
        out.push_str(&mask(found.as_str()));
        last = found.end();
    }
    out.push_str(&text[last..]);
    (out, detected)
}

fn detect_email(text: &str) -> bool {
    EMAIL_PATTERN.is_match(text)
}

fn detect_address(text: &str) -> bool {
    let keyword_hits = ADDRESS_KEYWORDS
        .iter()
        .filter(|keyword| text.contains(*keyword))
        .count();
    keyword_hits >= 2 || ADDRESS_PATTERN.is_match(text)
}

fn detect_medical_terms(text: &str) -> bool {
    MEDICAL_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::{
        SAFETY_MESSAGE, TYPE_ADDRESS, TYPE_EMAIL, TYPE_MEDICAL, TYPE_PHONE, TYPE_RESIDENT_ID,
        check, format_warnings,
    };

    #[test]
    fn phone_number_is_masked_to_head_and_tail_digits() {
        let report = check("제 번호는 010-1234-5678입니다");
        assert!(report.has_pii);
        assert!(report.masked_text.contains("010-****-5678"));
        assert!(!report.masked_text.contains("1234-5678"));
        assert!(report.detected_types.contains(&TYPE_PHONE.to_string()));
    }

    #[test]
    fn phone_number_without_separators_is_masked() {
        let report = check("01012345678 로 연락주세요");
        assert!(report.masked_text.contains("010-****-5678"));
        assert!(report.detected_types.contains(&TYPE_PHONE.to_string()));
    }

    #[test]
    fn seoul_landline_mask_takes_the_first_three_digits() {
        let report = check("사무실은 02-123-4567");
        assert!(report.detected_types.contains(&TYPE_PHONE.to_string()));
        assert_eq!(report.masked_text, "사무실은 021-****-4567");
    }

    #[test]
    fn resident_registration_number_is_fully_replaced() {
        let report = check("990101-1234567");
        assert_eq!(report.masked_text, "******-*******");
        assert!(report.detected_types.contains(&TYPE_RESIDENT_ID.to_string()));
        assert!(!report.detected_types.contains(&TYPE_PHONE.to_string()));
    }

    #[test]
    fn resident_registration_number_without_hyphen_is_replaced() {
        let report = check("주민번호 9901011234567 입니다");
        assert!(report.masked_text.contains("******-*******"));
        assert!(!report.masked_text.contains("9901011234567"));
    }

    #[test]
    fn email_is_flagged_but_not_masked() {
        let report = check("메일은 grandma@example.com 입니다");
        assert!(report.has_pii);
        assert!(report.masked_text.contains("grandma@example.com"));
        assert!(report.detected_types.contains(&TYPE_EMAIL.to_string()));
    }

    #[test]
    fn address_requires_two_keywords_or_region_district_pair() {
        let flagged = check("의정부시 호원동 아파트에 살아요");
        assert!(flagged.detected_types.contains(&TYPE_ADDRESS.to_string()));

        let pair_only = check("서울시 강남구 근처입니다");
        assert!(pair_only.detected_types.contains(&TYPE_ADDRESS.to_string()));
    }

    #[test]
    fn medical_terms_are_flagged_without_masking() {
        let report = check("어머니가 치매 진단을 받으셨어요");
        assert!(report.detected_types.contains(&TYPE_MEDICAL.to_string()));
        assert!(report.masked_text.contains("치매"));
    }

    #[test]
    fn clean_text_produces_no_findings() {
        let report = check("면회 시간이 궁금합니다");
        assert!(!report.has_pii);
        assert_eq!(report.masked_text, "면회 시간이 궁금합니다");
        assert!(report.warnings.is_empty());
        assert!(report.detected_types.is_empty());
    }

    #[test]
    fn pipeline_is_idempotent_on_masked_text() {
        let first = check("010-1234-5678 그리고 990101-2345678");
        let second = check(&first.masked_text);
        assert!(!second.has_pii);
        assert_eq!(second.masked_text, first.masked_text);
    }

    #[test]
    fn warnings_format_as_bulleted_advisory() {
        let report = check("010-1234-5678");
        let advisory = format_warnings(&report.warnings);
        assert!(advisory.starts_with("\n\n⚠️ 보안 안내:"));
        assert!(advisory.contains("• 전화번호"));

        assert_eq!(format_warnings(&[]), "");
    }

    #[test]
    fn safety_message_mentions_the_sensitive_categories() {
        assert!(SAFETY_MESSAGE.contains("민감정보"));
    }
}
