//! Constant pool decoding and typed accessors.

use crate::reader::Reader;
use crate::ClassError;

/// One constant pool slot.
///
/// Only the kinds the model consumes carry payloads; reference kinds are
/// decoded for their size and retained as opaque entries so that index
/// validation still works.
#[derive(Debug, Clone)]
pub(crate) enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    StringRef(u16),
    NameAndType(u16, u16),
    /// Fieldref / Methodref / InterfaceMethodref / Dynamic / InvokeDynamic.
    Reference,
    MethodHandle,
    MethodType(u16),
    Module(u16),
    Package(u16),
    /// Slot 0 and the second slot of `Long`/`Double`.
    Unused,
}

/// Decoded constant pool with typed, index-validating accessors.
pub(crate) struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    pub(crate) fn read(r: &mut Reader<'_>) -> Result<Self, ClassError> {
        let count = r.u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(Constant::Unused);
        let mut index: u16 = 1;
        while index < count {
            let tag = r.u8()?;
            let entry = match tag {
                1 => {
                    let len = r.u16()? as usize;
                    let bytes = r.take(len)?;
                    let text = std::str::from_utf8(bytes)
                        .map_err(|_| ClassError::BadUtf8 { index })?;
                    Constant::Utf8(text.to_string())
                }
                3 => Constant::Integer(r.u32()? as i32),
                4 => Constant::Float(f32::from_bits(r.u32()?)),
                5 => {
                    let high = u64::from(r.u32()?);
                    let low = u64::from(r.u32()?);
                    Constant::Long(((high << 32) | low) as i64)
                }
                6 => {
                    let high = u64::from(r.u32()?);
                    let low = u64::from(r.u32()?);
                    Constant::Double(f64::from_bits((high << 32) | low))
                }
                7 => Constant::Class(r.u16()?),
                8 => Constant::StringRef(r.u16()?),
                9 | 10 | 11 => {
                    r.skip(4)?;
                    Constant::Reference
                }
                12 => Constant::NameAndType(r.u16()?, r.u16()?),
                15 => {
                    r.skip(3)?;
                    Constant::MethodHandle
                }
                16 => Constant::MethodType(r.u16()?),
                17 | 18 => {
                    r.skip(4)?;
                    Constant::Reference
                }
                19 => Constant::Module(r.u16()?),
                20 => Constant::Package(r.u16()?),
                _ => return Err(ClassError::BadConstantTag { tag, index }),
            };
            let wide = matches!(entry, Constant::Long(_) | Constant::Double(_));
            entries.push(entry);
            index += 1;
            if wide {
                // Long and Double occupy two slots.
                entries.push(Constant::Unused);
                index += 1;
            }
        }
        Ok(ConstantPool { entries })
    }

    fn get(&self, index: u16, expected: &'static str) -> Result<&Constant, ClassError> {
        self.entries
            .get(index as usize)
            .ok_or(ClassError::BadConstant { index, expected })
    }

    pub(crate) fn utf8(&self, index: u16) -> Result<&str, ClassError> {
        match self.get(index, "Utf8")? {
            Constant::Utf8(text) => Ok(text),
            _ => Err(ClassError::BadConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    pub(crate) fn integer(&self, index: u16) -> Result<i32, ClassError> {
        match self.get(index, "Integer")? {
            Constant::Integer(value) => Ok(*value),
            _ => Err(ClassError::BadConstant {
                index,
                expected: "Integer",
            }),
        }
    }

    pub(crate) fn class_name(&self, index: u16) -> Result<&str, ClassError> {
        match self.get(index, "Class")? {
            Constant::Class(name_index) => self.utf8(*name_index),
            _ => Err(ClassError::BadConstant {
                index,
                expected: "Class",
            }),
        }
    }

    /// `Class` entry or `None` for index 0 (the super class of `Object`).
    pub(crate) fn opt_class_name(&self, index: u16) -> Result<Option<&str>, ClassError> {
        if index == 0 {
            Ok(None)
        } else {
            self.class_name(index).map(Some)
        }
    }

    pub(crate) fn module_name(&self, index: u16) -> Result<&str, ClassError> {
        match self.get(index, "Module")? {
            Constant::Module(name_index) => self.utf8(*name_index),
            _ => Err(ClassError::BadConstant {
                index,
                expected: "Module",
            }),
        }
    }

    pub(crate) fn package_name(&self, index: u16) -> Result<&str, ClassError> {
        match self.get(index, "Package")? {
            Constant::Package(name_index) => self.utf8(*name_index),
            _ => Err(ClassError::BadConstant {
                index,
                expected: "Package",
            }),
        }
    }

    pub(crate) fn opt_utf8(&self, index: u16) -> Result<Option<&str>, ClassError> {
        if index == 0 {
            Ok(None)
        } else {
            self.utf8(index).map(Some)
        }
    }

    pub(crate) fn long(&self, index: u16) -> Result<i64, ClassError> {
        match self.get(index, "Long")? {
            Constant::Long(value) => Ok(*value),
            _ => Err(ClassError::BadConstant {
                index,
                expected: "Long",
            }),
        }
    }

    pub(crate) fn float(&self, index: u16) -> Result<f32, ClassError> {
        match self.get(index, "Float")? {
            Constant::Float(value) => Ok(*value),
            _ => Err(ClassError::BadConstant {
                index,
                expected: "Float",
            }),
        }
    }

    pub(crate) fn double(&self, index: u16) -> Result<f64, ClassError> {
        match self.get(index, "Double")? {
            Constant::Double(value) => Ok(*value),
            _ => Err(ClassError::BadConstant {
                index,
                expected: "Double",
            }),
        }
    }
}
