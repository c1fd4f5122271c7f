//! Handle reference codes.
//!
//! A handle in the bit stream is `|CODE (4 bits)|COUNTER (4 bits)|N bytes|`.
//! Codes 2-5 carry an absolute handle; 6, 8, 0xA and 0xC are relative to a
//! reference handle (normally the handle of the object being decoded).

use crate::error::{DxfError, Result};
use crate::types::Handle;

/// Reference code of an encoded handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DwgReferenceType {
    /// Code 0, used for the object's own handle.
    Undefined = 0,
    SoftOwnership = 2,
    HardOwnership = 3,
    SoftPointer = 4,
    HardPointer = 5,
    /// reference + 1
    PlusOne = 6,
    /// reference - 1
    MinusOne = 8,
    /// reference + offset
    PlusOffset = 0xA,
    /// reference - offset
    MinusOffset = 0xC,
}

impl DwgReferenceType {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(DwgReferenceType::Undefined),
            2 => Some(DwgReferenceType::SoftOwnership),
            3 => Some(DwgReferenceType::HardOwnership),
            4 => Some(DwgReferenceType::SoftPointer),
            5 => Some(DwgReferenceType::HardPointer),
            6 => Some(DwgReferenceType::PlusOne),
            8 => Some(DwgReferenceType::MinusOne),
            0xA => Some(DwgReferenceType::PlusOffset),
            0xC => Some(DwgReferenceType::MinusOffset),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Whether the stored value is the handle itself.
    pub fn is_absolute(&self) -> bool {
        (*self as u8) <= 5
    }
}

/// A handle reference as stored: code plus raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HandleReference {
    pub code: u8,
    pub value: u64,
}

impl HandleReference {
    /// Store `target` with the given code; relative codes are expressed
    /// against `reference`.
    ///
    /// Fails when a relative code cannot express the distance (e.g. `PlusOne`
    /// for a target that is not `reference + 1`).
    pub fn encode(kind: DwgReferenceType, target: Handle, reference: Handle) -> Result<Self> {
        let t = target.value();
        let r = reference.value();
        let value = match kind {
            k if k.is_absolute() => t,
            DwgReferenceType::PlusOne if t == r.wrapping_add(1) => 0,
            DwgReferenceType::MinusOne if t == r.wrapping_sub(1) => 0,
            DwgReferenceType::PlusOffset if t >= r => t - r,
            DwgReferenceType::MinusOffset if t <= r => r - t,
            _ => {
                return Err(DxfError::Parse(format!(
                    "Reference code {:#X} cannot express {target} relative to {reference}",
                    kind.code()
                )))
            }
        };
        Ok(Self {
            code: kind.code(),
            value,
        })
    }

    /// Absolute handle given the reference handle.
    pub fn resolve(&self, reference: Handle) -> Result<Handle> {
        let r = reference.value();
        let absolute = match self.code {
            0..=5 => self.value,
            0x6 => r.wrapping_add(1),
            0x8 => r.wrapping_sub(1),
            0xA => r.wrapping_add(self.value),
            0xC => r.wrapping_sub(self.value),
            code => {
                return Err(DxfError::Parse(format!(
                    "Invalid handle reference code: {code:#X}"
                )))
            }
        };
        Ok(Handle::new(absolute))
    }

    pub fn reference_type(&self) -> Option<DwgReferenceType> {
        DwgReferenceType::from_code(self.code)
    }

    /// Number of value bytes following the code byte.
    pub fn counter(&self) -> u8 {
        Handle::new(self.value).byte_count()
    }
}
