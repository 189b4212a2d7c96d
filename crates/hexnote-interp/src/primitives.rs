//! Fixed-width integer interpreters.
//!
//! Little-endian reads treat the byte at the range start as least
//! significant; big-endian is the mirror. Unsigned values are zero-extended
//! and signed values are sign-extended from the top decoded bit.

use std::sync::Arc;

use hexnote_types::{Binary, Range};

use crate::error::{InterpError, InterpResult};
use crate::interpreter::{Interpreter, InterpreterInfo};
use crate::options::{OptionSpec, OptionValues};
use crate::value::Value;

/// Integer width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

impl IntWidth {
    pub const fn bytes(self) -> usize {
        match self {
            Self::W8 => 1,
            Self::W16 => 2,
            Self::W32 => 4,
            Self::W64 => 8,
        }
    }

    pub const fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }
}

/// Byte order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Big,
    Little,
}

/// A fixed-width signed or unsigned integer interpreter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PrimitiveInterpreter {
    width: IntWidth,
    signed: bool,
    order: ByteOrder,
}

impl PrimitiveInterpreter {
    pub const UINT8: Self = Self::new(IntWidth::W8, false, ByteOrder::Big);
    pub const INT8: Self = Self::new(IntWidth::W8, true, ByteOrder::Big);
    pub const UINT16_BE: Self = Self::new(IntWidth::W16, false, ByteOrder::Big);
    pub const UINT16_LE: Self = Self::new(IntWidth::W16, false, ByteOrder::Little);
    pub const INT16_BE: Self = Self::new(IntWidth::W16, true, ByteOrder::Big);
    pub const INT16_LE: Self = Self::new(IntWidth::W16, true, ByteOrder::Little);
    pub const UINT32_BE: Self = Self::new(IntWidth::W32, false, ByteOrder::Big);
    pub const UINT32_LE: Self = Self::new(IntWidth::W32, false, ByteOrder::Little);
    pub const INT32_BE: Self = Self::new(IntWidth::W32, true, ByteOrder::Big);
    pub const INT32_LE: Self = Self::new(IntWidth::W32, true, ByteOrder::Little);
    pub const UINT64_BE: Self = Self::new(IntWidth::W64, false, ByteOrder::Big);
    pub const UINT64_LE: Self = Self::new(IntWidth::W64, false, ByteOrder::Little);
    pub const INT64_BE: Self = Self::new(IntWidth::W64, true, ByteOrder::Big);
    pub const INT64_LE: Self = Self::new(IntWidth::W64, true, ByteOrder::Little);

    /// Every integer interpreter, in the order they are offered to users.
    pub const ALL: [Self; 14] = [
        Self::UINT8,
        Self::INT8,
        Self::UINT16_BE,
        Self::UINT16_LE,
        Self::INT16_BE,
        Self::INT16_LE,
        Self::UINT32_BE,
        Self::UINT32_LE,
        Self::INT32_BE,
        Self::INT32_LE,
        Self::UINT64_BE,
        Self::UINT64_LE,
        Self::INT64_BE,
        Self::INT64_LE,
    ];

    /// Byte order is irrelevant for single bytes and is normalized away.
    pub const fn new(width: IntWidth, signed: bool, order: ByteOrder) -> Self {
        let order = match width {
            IntWidth::W8 => ByteOrder::Big,
            _ => order,
        };
        Self {
            width,
            signed,
            order,
        }
    }

    /// Stable type name, e.g. `uint32le`.
    pub fn name(&self) -> &'static str {
        use ByteOrder::{Big, Little};
        use IntWidth::*;
        match (self.signed, self.width, self.order) {
            (false, W8, _) => "uint8",
            (true, W8, _) => "int8",
            (false, W16, Big) => "uint16be",
            (false, W16, Little) => "uint16le",
            (true, W16, Big) => "int16be",
            (true, W16, Little) => "int16le",
            (false, W32, Big) => "uint32be",
            (false, W32, Little) => "uint32le",
            (true, W32, Big) => "int32be",
            (true, W32, Little) => "int32le",
            (false, W64, Big) => "uint64be",
            (false, W64, Little) => "uint64le",
            (true, W64, Big) => "int64be",
            (true, W64, Little) => "int64le",
        }
    }

    /// Look up an integer interpreter by its type name.
    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    fn describe(&self) -> String {
        let sign = if self.signed { "Signed" } else { "Unsigned" };
        match (self.width, self.order) {
            (IntWidth::W8, _) => format!("{sign} 8-bit Integer"),
            (width, ByteOrder::Big) => format!("{sign} {}-bit Integer (Big Endian)", width.bits()),
            (width, ByteOrder::Little) => {
                format!("{sign} {}-bit Integer (Little Endian)", width.bits())
            }
        }
    }

    /// Combine raw bytes into a value according to width, order and sign.
    pub fn decode(&self, bytes: &[u8]) -> Value {
        let raw = match self.order {
            ByteOrder::Big => bytes.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64),
            ByteOrder::Little => bytes
                .iter()
                .rev()
                .fold(0u64, |acc, b| (acc << 8) | *b as u64),
        };
        if self.signed {
            let shift = 64 - self.width.bits();
            Value::Signed(((raw << shift) as i64) >> shift)
        } else {
            Value::Unsigned(raw)
        }
    }
}

impl Interpreter for PrimitiveInterpreter {
    fn type_name(&self) -> &str {
        self.name()
    }

    fn human_name(&self) -> String {
        self.describe()
    }

    fn options(&self) -> OptionValues {
        OptionValues::new()
    }

    fn fixed_length(&self) -> Option<u64> {
        Some(self.width.bytes() as u64)
    }

    fn interpret(&self, binary: &dyn Binary, range: Range) -> InterpResult<Value> {
        let expected = self.width.bytes() as u64;
        if range.length() != expected {
            return Err(InterpError::LengthMismatch {
                type_name: self.name().to_string(),
                expected,
                actual: range.length(),
            });
        }
        let mut buf = [0u8; 8];
        let bytes = &mut buf[..self.width.bytes()];
        binary.read_into(range.position(), bytes)?;
        Ok(self.decode(bytes))
    }
}

/// [`InterpreterInfo`] for one integer interpreter. Integers take no options.
#[derive(Debug)]
pub struct PrimitiveInfo {
    interpreter: PrimitiveInterpreter,
    human_name: String,
}

impl PrimitiveInfo {
    pub fn new(interpreter: PrimitiveInterpreter) -> Self {
        Self {
            interpreter,
            human_name: interpreter.describe(),
        }
    }

    /// Infos for every integer interpreter.
    pub fn all() -> Vec<Self> {
        PrimitiveInterpreter::ALL.into_iter().map(Self::new).collect()
    }
}

impl InterpreterInfo for PrimitiveInfo {
    fn type_name(&self) -> &str {
        self.interpreter.name()
    }

    fn human_name(&self) -> &str {
        &self.human_name
    }

    fn options(&self) -> &[OptionSpec] {
        &[]
    }

    fn create(&self, options: &OptionValues) -> InterpResult<Arc<dyn Interpreter>> {
        options.resolve(self.interpreter.name(), &[])?;
        Ok(Arc::new(self.interpreter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexnote_types::{ByteBinary, TypeError};
    use proptest::prelude::*;

    fn range(position: u64, length: u64) -> Range {
        Range::new(position, length).unwrap()
    }

    #[test]
    fn uint32_little_endian_reads_low_byte_first() {
        let binary = ByteBinary::from(vec![0x01, 0x00, 0x00, 0x00]);
        let value = PrimitiveInterpreter::UINT32_LE
            .interpret(&binary, range(0, 4))
            .unwrap();
        assert_eq!(value, Value::Unsigned(1));
    }

    #[test]
    fn uint32_big_endian_reads_high_byte_first() {
        let binary = ByteBinary::from(vec![0x01, 0x00, 0x00, 0x00]);
        let value = PrimitiveInterpreter::UINT32_BE
            .interpret(&binary, range(0, 4))
            .unwrap();
        assert_eq!(value, Value::Unsigned(16777216));
    }

    #[test]
    fn signed_values_are_sign_extended() {
        let binary = ByteBinary::from(vec![0xfe, 0xff, 0x80]);
        assert_eq!(
            PrimitiveInterpreter::INT16_LE
                .interpret(&binary, range(0, 2))
                .unwrap(),
            Value::Signed(-2)
        );
        assert_eq!(
            PrimitiveInterpreter::INT8.interpret(&binary, range(2, 1)).unwrap(),
            Value::Signed(-128)
        );
        assert_eq!(
            PrimitiveInterpreter::UINT8.interpret(&binary, range(2, 1)).unwrap(),
            Value::Unsigned(128)
        );
    }

    #[test]
    fn int64_extremes() {
        let binary = ByteBinary::from(vec![0x80, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(
            PrimitiveInterpreter::INT64_BE
                .interpret(&binary, range(0, 8))
                .unwrap(),
            Value::Signed(i64::MIN)
        );
        assert_eq!(
            PrimitiveInterpreter::UINT64_LE
                .interpret(&binary, range(0, 8))
                .unwrap(),
            Value::Unsigned(0x80)
        );
    }

    #[test]
    fn reading_past_end_fails() {
        let binary = ByteBinary::from(vec![0x01, 0x02, 0x03]);
        let err = PrimitiveInterpreter::UINT32_LE
            .interpret(&binary, range(0, 4))
            .unwrap_err();
        assert!(matches!(err, InterpError::Read(TypeError::OutOfRange { .. })));
    }

    #[test]
    fn wrong_range_length_is_rejected() {
        let binary = ByteBinary::from(vec![0; 8]);
        let err = PrimitiveInterpreter::UINT16_BE
            .interpret(&binary, range(0, 3))
            .unwrap_err();
        assert_eq!(
            err,
            InterpError::LengthMismatch {
                type_name: "uint16be".into(),
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn names_are_unique_and_resolvable() {
        for p in PrimitiveInterpreter::ALL {
            assert_eq!(PrimitiveInterpreter::by_name(p.name()), Some(p));
        }
        let mut names: Vec<&str> = PrimitiveInterpreter::ALL.iter().map(|p| p.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 14);
    }

    #[test]
    fn human_names() {
        assert_eq!(
            PrimitiveInterpreter::UINT32_LE.human_name(),
            "Unsigned 32-bit Integer (Little Endian)"
        );
        assert_eq!(PrimitiveInterpreter::INT8.human_name(), "Signed 8-bit Integer");
    }

    #[test]
    fn info_rejects_options() {
        let info = PrimitiveInfo::new(PrimitiveInterpreter::UINT32_LE);
        assert!(info.create(&OptionValues::new()).is_ok());
        assert!(matches!(
            info.create(&OptionValues::new().with("charset", "UTF-8")),
            Err(InterpError::UnknownOption { .. })
        ));
    }

    proptest! {
        #[test]
        fn endianness_mirrors(bytes in proptest::array::uniform4(any::<u8>())) {
            let binary = ByteBinary::from(bytes.to_vec());
            let le = PrimitiveInterpreter::UINT32_LE.interpret(&binary, range(0, 4)).unwrap();
            prop_assert_eq!(le, Value::Unsigned(u32::from_le_bytes(bytes) as u64));
            let be = PrimitiveInterpreter::INT32_BE.interpret(&binary, range(0, 4)).unwrap();
            prop_assert_eq!(be, Value::Signed(i32::from_be_bytes(bytes) as i64));
        }
    }
}
