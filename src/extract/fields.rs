use crate::model::PositionedFragment;

/// Field names the assembler routes values by.
pub mod field {
    pub const DETAIL_NUMBER: &str = "detail_number";
    pub const VEHICLE_OWNER: &str = "vehicle_owner";
    pub const VEHICLE_NAME: &str = "vehicle_name";
    pub const REGISTRATION_NUMBER: &str = "registration_number";
    pub const FRAME_NUMBER: &str = "frame_number";
    pub const MODEL_SPEC: &str = "model_spec";
    pub const FIRST_REGISTRATION: &str = "first_registration";
    pub const INSPECTION_EXPIRY: &str = "inspection_expiry";
    pub const USAGE_VEHICLE_TYPE: &str = "usage_vehicle_type";
    pub const IS_ELECTRIC_VEHICLE: &str = "is_electric_vehicle";
    pub const IS_HYBRID: &str = "is_hybrid";
    pub const IS_AEB: &str = "is_aeb";
    pub const DOCUMENT_DATE: &str = "document_date";
}

/// Where one labelled value sits relative to its label on the page grid.
/// Tolerances are tuned per field against the insurer's fixed layout.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub y_tolerance: i32,
    pub x_max: i32,
}

/// A presence/absence marker placed in a narrow band right of its label.
#[derive(Debug, Clone, Copy)]
pub struct FlagSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub y_tolerance: i32,
    pub x_band: i32,
}

/// Declarative layout of one insurer document format. Adding or retuning a
/// field is a data change here, not new control flow.
#[derive(Debug, Clone, Copy)]
pub struct LayoutProfile {
    pub fields: &'static [FieldSpec],
    pub flags: &'static [FlagSpec],
    pub date_field: FieldSpec,
    pub present_marker: &'static str,
}

const INSURER_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: field::DETAIL_NUMBER,
        label: "明細番号",
        y_tolerance: 2,
        x_max: 220,
    },
    FieldSpec {
        name: field::VEHICLE_OWNER,
        label: "車両所有者",
        y_tolerance: 2,
        x_max: 560,
    },
    FieldSpec {
        name: field::VEHICLE_NAME,
        label: "車名",
        y_tolerance: 2,
        x_max: 320,
    },
    FieldSpec {
        name: field::REGISTRATION_NUMBER,
        label: "登録番号",
        y_tolerance: 2,
        x_max: 360,
    },
    FieldSpec {
        name: field::FRAME_NUMBER,
        label: "車台番号",
        y_tolerance: 2,
        x_max: 400,
    },
    FieldSpec {
        name: field::MODEL_SPEC,
        label: "型式",
        y_tolerance: 2,
        x_max: 320,
    },
    FieldSpec {
        name: field::FIRST_REGISTRATION,
        label: "初度登録",
        y_tolerance: 2,
        x_max: 300,
    },
    FieldSpec {
        name: field::INSPECTION_EXPIRY,
        label: "車検満了日",
        y_tolerance: 2,
        x_max: 300,
    },
    FieldSpec {
        name: field::USAGE_VEHICLE_TYPE,
        label: "用途車種",
        y_tolerance: 2,
        x_max: 300,
    },
];

const INSURER_FLAGS: &[FlagSpec] = &[
    FlagSpec {
        name: field::IS_ELECTRIC_VEHICLE,
        label: "電気自動車",
        y_tolerance: 2,
        x_band: 60,
    },
    FlagSpec {
        name: field::IS_HYBRID,
        label: "ハイブリッド車",
        y_tolerance: 2,
        x_band: 60,
    },
    FlagSpec {
        name: field::IS_AEB,
        label: "AEB装着",
        y_tolerance: 2,
        x_band: 60,
    },
];

impl LayoutProfile {
    /// Layout of the insurer's monthly certificate document.
    pub fn insurer_default() -> Self {
        Self {
            fields: INSURER_FIELDS,
            flags: INSURER_FLAGS,
            date_field: FieldSpec {
                name: field::DOCUMENT_DATE,
                label: "発行日",
                y_tolerance: 2,
                x_max: 400,
            },
            present_marker: "有",
        }
    }
}

/// Reads the value anchored to `label`: fragments on the same visual row,
/// strictly right of the label and left of `x_max`, joined left to right.
/// An absent label yields an empty string; many fields are optional.
pub fn find_value(
    fragments: &[PositionedFragment],
    label: &str,
    y_tolerance: i32,
    x_max: i32,
) -> String {
    let Some(anchor) = fragments
        .iter()
        .find(|fragment| fragment.text == label || fragment.text.contains(label))
    else {
        return String::new();
    };

    let mut values: Vec<&PositionedFragment> = fragments
        .iter()
        .filter(|fragment| {
            (fragment.y - anchor.y).abs() <= y_tolerance
                && fragment.x > anchor.x
                && fragment.x < x_max
        })
        .collect();
    values.sort_by_key(|fragment| fragment.x);

    values
        .iter()
        .map(|fragment| fragment.text.as_str())
        .collect::<Vec<&str>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Reads a presence marker in the narrow band right of `label`. Only the
/// literal "present" token counts; anything else, including nothing, is false.
pub fn find_flag(
    fragments: &[PositionedFragment],
    label: &str,
    y_tolerance: i32,
    x_band: i32,
    present_marker: &str,
) -> bool {
    let Some(anchor) = fragments
        .iter()
        .find(|fragment| fragment.text == label || fragment.text.contains(label))
    else {
        return false;
    };

    let mut band: Vec<&PositionedFragment> = fragments
        .iter()
        .filter(|fragment| {
            (fragment.y - anchor.y).abs() <= y_tolerance
                && fragment.x > anchor.x
                && fragment.x <= anchor.x + x_band
        })
        .collect();
    band.sort_by_key(|fragment| fragment.x);

    band.first()
        .map(|fragment| fragment.text.trim() == present_marker)
        .unwrap_or(false)
}
