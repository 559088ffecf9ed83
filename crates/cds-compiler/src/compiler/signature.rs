//! Solidity-like declaration signatures for ABI entries.

use crate::abi::{AbiEntry, AbiEntryKind};

/// Builds `event Name(type [indexed ]name, ...)`.
///
/// Input names are used as given; default them before calling.
pub fn event_signature(entry: &AbiEntry) -> String {
    let params = entry
        .inputs
        .iter()
        .map(|input| {
            let indexed = if input.indexed { "indexed " } else { "" };
            format!("{} {indexed}{}", input.ty, input.name())
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("event {}({params})", entry.name())
}

/// Builds `function Name(type name, ...)` followed by [`function_suffix`].
pub fn function_signature(entry: &AbiEntry) -> String {
    let params = entry
        .inputs
        .iter()
        .map(|input| format!("{} {}", input.ty, input.name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "function {}({params}){}",
        entry.name(),
        function_suffix(entry)
    )
}

/// Returns `" payable view pure returns (T)"`, keeping only the parts that
/// apply, or `""` when none do.
pub fn function_suffix(entry: &AbiEntry) -> String {
    let mut items = Vec::new();
    if entry.is_payable() {
        items.push("payable".to_string());
    }
    if entry.is_constant() {
        items.push("view".to_string());
    }
    if entry.is_pure() {
        items.push("pure".to_string());
    }
    if !entry.outputs.is_empty() {
        let types = entry
            .outputs
            .iter()
            .map(|output| output.ty.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        items.push(format!("returns ({types})"));
    }
    if items.is_empty() {
        String::new()
    } else {
        format!(" {}", items.join(" "))
    }
}

/// Builds the signature matching the entry kind.
pub fn build_signature(entry: &AbiEntry) -> String {
    match entry.kind {
        AbiEntryKind::Event => event_signature(entry),
        _ => function_signature(entry),
    }
}
