//! Identifier humanization and key slugs.
//!
//! [`humanize`] turns contract identifiers such as `transferFrom`,
//! `getABI2Count` or `DOMAIN_SEPARATOR` into UI labels. It runs a fixed,
//! ordered cascade of [`HumanizeStep`]s; each step reads the previous step's
//! output, so the order is part of the contract.

use once_cell::sync::Lazy;
use regex::Regex;

/// One named substitution of the humanizer cascade.
#[derive(Debug)]
pub struct HumanizeStep {
    /// Step name, used in tests and diagnostics.
    pub name: &'static str,
    pattern: Regex,
    replacement: &'static str,
}

impl HumanizeStep {
    fn new(name: &'static str, pattern: &str, replacement: &'static str) -> Self {
        Self {
            name,
            // The patterns are literals covered by unit tests.
            pattern: Regex::new(pattern).expect("humanizer pattern must compile"),
            replacement,
        }
    }

    /// Applies this step to `input`.
    pub fn apply(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, self.replacement)
            .into_owned()
    }
}

static HUMANIZE_STEPS: Lazy<Vec<HumanizeStep>> = Lazy::new(|| {
    vec![
        HumanizeStep::new("underscores", r"_+", " "),
        HumanizeStep::new(
            "lower_then_capitalized",
            r"([a-z])([A-Z][a-z])",
            "${1} ${2}",
        ),
        HumanizeStep::new("capitalized_then_upper", r"([A-Z][a-z])([A-Z])", "${1} ${2}"),
        HumanizeStep::new("lower_then_acronym_word", r"([a-z])([A-Z]+[a-z])", "${1} ${2}"),
        HumanizeStep::new(
            "acronym_then_capitalized_word",
            r"([A-Z]+)([A-Z][a-z][a-z])",
            "${1} ${2}",
        ),
        HumanizeStep::new(
            "lower_then_acronym_or_digits",
            r"([a-z]+)([A-Z0-9]+)",
            "${1} ${2}",
        ),
        // `s` is excluded so acronym plurals such as `ABCs` stay attached.
        HumanizeStep::new(
            "acronym_then_word_except_plural",
            r"([A-Z]+)([A-Z][a-rt-z][a-z]*)",
            "${1} ${2}",
        ),
        HumanizeStep::new("digit_then_capitalized_word", r"([0-9])([A-Z][a-z]+)", "${1} ${2}"),
        // {2,} on both sides: `ABC26` splits, `R2D2` and `C3PO` do not.
        HumanizeStep::new("acronym_then_digits", r"([A-Z]{2,})([0-9]{2,})", "${1} ${2}"),
        HumanizeStep::new("digits_then_acronym", r"([0-9]{2,})([A-Z]{2,})", "${1} ${2}"),
    ]
});

/// Returns the humanizer cascade in application order.
pub fn humanize_steps() -> &'static [HumanizeStep] {
    &HUMANIZE_STEPS
}

/// Runs the substitution cascade, then trims and capitalizes the first
/// character. Casing elsewhere is left as the cascade produced it.
pub fn split_words(identifier: &str) -> String {
    let spaced = humanize_steps()
        .iter()
        .fold(identifier.to_string(), |text, step| step.apply(&text));
    capitalize_first(spaced.trim())
}

/// Converts an identifier into a human-readable label.
///
/// ```
/// use cds_compiler::compiler::humanize;
///
/// assert_eq!(humanize("transferFrom"), "Transfer from");
/// assert_eq!(humanize("getABI2Count"), "Get ABI2 count");
/// assert_eq!(humanize("R2D2"), "R2D2");
/// ```
pub fn humanize(identifier: &str) -> String {
    sentence_case(&split_words(identifier))
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Lowercases every capitalized word after the first. Acronyms, acronym
/// plurals, digit blocks and single letters are kept as they are.
fn sentence_case(text: &str) -> String {
    text.split(' ')
        .enumerate()
        .map(|(index, word)| {
            if index > 0 && is_capitalized_word(word) {
                let mut chars = word.chars();
                chars
                    .next()
                    .map(|first| first.to_ascii_lowercase())
                    .into_iter()
                    .chain(chars)
                    .collect()
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn is_capitalized_word(word: &str) -> bool {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if first.is_ascii_uppercase() => {
            let rest = chars.as_str();
            !rest.is_empty() && rest.chars().all(|c| c.is_ascii_lowercase())
        }
        _ => false,
    }
}

static SLUG_INVALID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s-]").unwrap());
static SLUG_SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s_-]+").unwrap());
static SLUG_EDGES: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-+|-+$").unwrap());

/// Converts a connector name into a URL-safe key.
///
/// ```
/// use cds_compiler::compiler::slugify;
///
/// assert_eq!(slugify("  My Token: V2! "), "my-token-v2");
/// ```
pub fn slugify(name: &str) -> String {
    let lower = name.to_lowercase();
    let stripped = SLUG_INVALID.replace_all(lower.trim(), "");
    let hyphenated = SLUG_SEPARATORS.replace_all(&stripped, "-");
    SLUG_EDGES.replace_all(&hyphenated, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "__ToGetYourGEDInTimeASongAboutThe26ABCsIsOfTheEssenceButAPersonalIDCardForUser_456InRoom26AContainingABC26TimesIsNotAsEasyAs123ForC3POOrR2D2Or2R2D";

    fn step(name: &str) -> &'static HumanizeStep {
        humanize_steps()
            .iter()
            .find(|s| s.name == name)
            .unwrap_or_else(|| panic!("no step named {name}"))
    }

    /// Output of the cascade on `SAMPLE` after each step.
    const SAMPLE_TRACE: [(&str, &str); 10] = [
        ("underscores", " ToGetYourGEDInTimeASongAboutThe26ABCsIsOfTheEssenceButAPersonalIDCardForUser 456InRoom26AContainingABC26TimesIsNotAsEasyAs123ForC3POOrR2D2Or2R2D"),
        ("lower_then_capitalized", " To Get YourGEDIn TimeASong About The26ABCs IsOf The Essence ButAPersonalIDCard For User 456In Room26AContainingABC26Times IsNot AsEasy As123ForC3POOrR2D2Or2R2D"),
        ("capitalized_then_upper", " To Get YourGEDIn TimeASong About The26ABCs Is Of The Essence ButAPersonalIDCard For User 456In Room26AContainingABC26Times Is Not As Easy As123ForC3POOr R2D2Or2R2D"),
        ("lower_then_acronym_word", " To Get Your GEDIn Time ASong About The26ABCs Is Of The Essence But APersonal IDCard For User 456In Room26AContainingABC26Times Is Not As Easy As123ForC3POOr R2D2Or2R2D"),
        ("acronym_then_capitalized_word", " To Get Your GEDIn Time A Song About The26ABCs Is Of The Essence But A Personal ID Card For User 456In Room26A ContainingABC26Times Is Not As Easy As123ForC3POOr R2D2Or2R2D"),
        ("lower_then_acronym_or_digits", " To Get Your GEDIn Time A Song About The 26ABCs Is Of The Essence But A Personal ID Card For User 456In Room 26A Containing ABC26Times Is Not As Easy As 123For C3POOr R2D2Or 2R2D"),
        ("acronym_then_word_except_plural", " To Get Your GED In Time A Song About The 26ABCs Is Of The Essence But A Personal ID Card For User 456In Room 26A Containing ABC26Times Is Not As Easy As 123For C3PO Or R2D2Or 2R2D"),
        ("digit_then_capitalized_word", " To Get Your GED In Time A Song About The 26ABCs Is Of The Essence But A Personal ID Card For User 456 In Room 26A Containing ABC26 Times Is Not As Easy As 123 For C3PO Or R2D2 Or 2R2D"),
        ("acronym_then_digits", " To Get Your GED In Time A Song About The 26ABCs Is Of The Essence But A Personal ID Card For User 456 In Room 26A Containing ABC 26 Times Is Not As Easy As 123 For C3PO Or R2D2 Or 2R2D"),
        ("digits_then_acronym", " To Get Your GED In Time A Song About The 26 ABCs Is Of The Essence But A Personal ID Card For User 456 In Room 26A Containing ABC 26 Times Is Not As Easy As 123 For C3PO Or R2D2 Or 2R2D"),
    ];

    #[test]
    fn test_step_order() {
        let names: Vec<_> = humanize_steps().iter().map(|s| s.name).collect();
        let expected: Vec<_> = SAMPLE_TRACE.iter().map(|(name, _)| *name).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_each_step_on_sample_trace() {
        let mut input = SAMPLE.to_string();
        for (name, expected) in SAMPLE_TRACE {
            let output = step(name).apply(&input);
            assert_eq!(output, expected, "step {name}");
            input = output;
        }
    }

    #[test]
    fn test_underscores() {
        assert_eq!(step("underscores").apply("a__b_c"), "a b c");
    }

    #[test]
    fn test_lower_then_capitalized() {
        assert_eq!(step("lower_then_capitalized").apply("fooBar"), "foo Bar");
        assert_eq!(step("lower_then_capitalized").apply("fooBAR"), "fooBAR");
    }

    #[test]
    fn test_capitalized_then_upper() {
        assert_eq!(step("capitalized_then_upper").apply("FooB"), "Foo B");
    }

    #[test]
    fn test_lower_then_acronym_word() {
        assert_eq!(step("lower_then_acronym_word").apply("yourGEDIn"), "your GEDIn");
    }

    #[test]
    fn test_acronym_then_capitalized_word() {
        assert_eq!(
            step("acronym_then_capitalized_word").apply("IDCard"),
            "ID Card"
        );
    }

    #[test]
    fn test_lower_then_acronym_or_digits() {
        assert_eq!(
            step("lower_then_acronym_or_digits").apply("getABI2Count"),
            "get ABI2Count"
        );
        assert_eq!(step("lower_then_acronym_or_digits").apply("param0"), "param 0");
    }

    #[test]
    fn test_acronym_then_word_keeps_plural() {
        let step = step("acronym_then_word_except_plural");
        assert_eq!(step.apply("GEDIn"), "GED In");
        assert_eq!(step.apply("ABCs"), "ABCs");
        assert_eq!(step.apply("C3POOr"), "C3PO Or");
    }

    #[test]
    fn test_digit_then_capitalized_word() {
        assert_eq!(
            step("digit_then_capitalized_word").apply("ABI2Count"),
            "ABI2 Count"
        );
        assert_eq!(step("digit_then_capitalized_word").apply("26ABCs"), "26ABCs");
    }

    #[test]
    fn test_acronym_then_digits_needs_two_of_each() {
        let step = step("acronym_then_digits");
        assert_eq!(step.apply("ABC26"), "ABC 26");
        assert_eq!(step.apply("R2D2"), "R2D2");
        assert_eq!(step.apply("AB2"), "AB2");
    }

    #[test]
    fn test_digits_then_acronym_needs_two_of_each() {
        let step = step("digits_then_acronym");
        assert_eq!(step.apply("26ABCs"), "26 ABCs");
        assert_eq!(step.apply("26A"), "26A");
        assert_eq!(step.apply("2R2D"), "2R2D");
    }

    #[test]
    fn test_split_words_sample() {
        assert_eq!(
            split_words(SAMPLE),
            "To Get Your GED In Time A Song About The 26 ABCs Is Of The Essence But A Personal ID Card For User 456 In Room 26A Containing ABC 26 Times Is Not As Easy As 123 For C3PO Or R2D2 Or 2R2D"
        );
    }

    #[test]
    fn test_humanize_literals() {
        assert_eq!(humanize("transferFrom"), "Transfer from");
        assert_eq!(humanize("getABI2Count"), "Get ABI2 count");
        assert_eq!(humanize("R2D2"), "R2D2");
        assert_eq!(humanize("C3PO"), "C3PO");
        assert_eq!(humanize("ABCs"), "ABCs");
        assert_eq!(humanize("balanceOf"), "Balance of");
    }

    #[test]
    fn test_humanize_common_identifiers() {
        assert_eq!(humanize("tokenURI"), "Token URI");
        assert_eq!(humanize("safeTransferFrom"), "Safe transfer from");
        assert_eq!(humanize("getNFTsOwned"), "Get NFTs owned");
        assert_eq!(humanize("getUSDPrice"), "Get USD price");
        assert_eq!(humanize("ERC20Transfer"), "ERC 20 transfer");
        assert_eq!(humanize("param0"), "Param 0");
        assert_eq!(humanize("_owner"), "Owner");
    }

    #[test]
    fn test_humanize_single_case_identifiers() {
        assert_eq!(humanize("owner"), "Owner");
        assert_eq!(humanize("mint"), "Mint");
        assert_eq!(humanize("WETH"), "WETH");
        assert_eq!(humanize("DOMAIN_SEPARATOR"), "DOMAIN SEPARATOR");
        assert_eq!(humanize("x"), "X");
    }

    #[test]
    fn test_humanize_sample_sentence_case() {
        assert_eq!(
            humanize(SAMPLE),
            "To get your GED in time A song about the 26 ABCs is of the essence but A personal ID card for user 456 in room 26A containing ABC 26 times is not as easy as 123 for C3PO or R2D2 or 2R2D"
        );
    }

    #[test]
    fn test_humanize_empty() {
        assert_eq!(humanize(""), "");
        assert_eq!(humanize("___"), "");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Token"), "my-token");
        assert_eq!(slugify("  Hello__World  "), "hello-world");
        assert_eq!(slugify("Uniswap V3: Router"), "uniswap-v3-router");
        assert_eq!(slugify("--edge--"), "edge");
        assert_eq!(slugify("a - b"), "a-b");
    }
}
