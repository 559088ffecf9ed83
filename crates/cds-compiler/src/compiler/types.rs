//! Type mapping between Solidity ABI types and connector field types.

use crate::abi::AbiParam;
use crate::cds::{Field, FieldType};
use crate::compiler::naming::humanize;

/// Placeholder shown on address inputs.
pub const ADDRESS_PLACEHOLDER: &str = "Enter a blockchain address";

/// Solidity types small enough to be carried as JSON numbers.
const NUMBER_TYPES: &[&str] = &[
    "uint8", "uint16", "uint32", "int8", "int16", "int32", "bytes1",
];

/// Maps a Solidity type to a connector field type.
///
/// Array-ness is ignored here; see [`is_list_type`]. Integers wider than
/// 32 bits map to [`FieldType::String`] so no precision is lost.
pub fn map_type(abi_type: &str) -> FieldType {
    let base = abi_type.replacen("[]", "", 1);
    match base.as_str() {
        "bool" => FieldType::Boolean,
        "address" => FieldType::Address,
        ty if NUMBER_TYPES.contains(&ty) => FieldType::Number,
        _ => FieldType::String,
    }
}

/// Whether a Solidity type is an array type.
pub fn is_list_type(abi_type: &str) -> bool {
    abi_type.contains("[]")
}

/// Builds a field for a named parameter.
///
/// The name must already be defaulted; this function does not invent keys.
pub fn to_field(name: &str, abi_type: &str) -> Field {
    // Address lists get no hint: the check is on the raw type.
    let placeholder = if abi_type == "address" {
        ADDRESS_PLACEHOLDER
    } else {
        ""
    };
    Field {
        key: name.to_string(),
        label: humanize(name),
        ty: map_type(abi_type),
        placeholder: Some(placeholder.to_string()),
        list: Some(is_list_type(abi_type)),
        required: None,
        help_text: None,
    }
}

/// Builds a field for the ABI input at position `index`, defaulting an empty
/// name to `"param" + index`.
pub fn abi_input_to_field(input: &AbiParam, index: usize) -> Field {
    to_field(&input.name_or_default(index), &input.ty)
}

/// Builds the synthetic `returnValue` output field of a view function.
pub fn return_value_field(function_name: &str, output_type: &str) -> Field {
    Field {
        key: "returnValue".to_string(),
        label: format!("Return value of {}", humanize(function_name)),
        ty: map_type(output_type),
        placeholder: None,
        list: None,
        required: None,
        help_text: None,
    }
}
