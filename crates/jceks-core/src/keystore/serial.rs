//! The subset of the Java Object Serialization Stream Protocol used by sealed keys.
//!
//! JCEKS stores each secret key as a serialized `SealedObjectForKeyProtector`, and
//! the sealed plaintext is itself a serialized `SecretKeySpec`. The reader accepts
//! the general grammar (class descriptor chains, back-references, enums, arrays,
//! custom `writeObject` annotations) so that streams written by any JDK parse, but
//! it only ever materialises plain data: no classes are loaded and nothing runs.
//! The writer emits exactly the shapes the JDK emits for those two classes.

use std::rc::Rc;

use thiserror::Error;
use zeroize::Zeroizing;

use super::codec::{self, ByteReader, CodecError};

pub const STREAM_MAGIC: u16 = 0xaced;
pub const STREAM_VERSION: u16 = 5;

const TC_NULL: u8 = 0x70;
const TC_REFERENCE: u8 = 0x71;
const TC_CLASSDESC: u8 = 0x72;
const TC_OBJECT: u8 = 0x73;
const TC_STRING: u8 = 0x74;
const TC_ARRAY: u8 = 0x75;
const TC_CLASS: u8 = 0x76;
const TC_BLOCKDATA: u8 = 0x77;
const TC_ENDBLOCKDATA: u8 = 0x78;
const TC_BLOCKDATALONG: u8 = 0x7a;
const TC_LONGSTRING: u8 = 0x7c;
const TC_ENUM: u8 = 0x7e;

const BASE_WIRE_HANDLE: u32 = 0x7e_0000;

pub const SC_WRITE_METHOD: u8 = 0x01;
pub const SC_SERIALIZABLE: u8 = 0x02;
pub const SC_EXTERNALIZABLE: u8 = 0x04;
pub const SC_BLOCK_DATA: u8 = 0x08;

const MAX_DEPTH: usize = 32;

/// Errors reading or writing a serialization stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SerialError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("Not a Java serialization stream (magic {magic:#06x}, version {version})")]
    InvalidHeader { magic: u16, version: u16 },

    #[error("Unexpected type code {code:#04x} at offset {offset}")]
    UnexpectedTypeCode { code: u8, offset: usize },

    #[error("Unknown handle {0:#x}")]
    UnknownHandle(u32),

    #[error("Handle {handle:#x} does not refer to a {expected}")]
    HandleKindMismatch { handle: u32, expected: &'static str },

    #[error("Unsupported stream construct: {0}")]
    Unsupported(&'static str),

    #[error("Object nesting exceeds {MAX_DEPTH} levels")]
    TooDeep,

    #[error("Expected an instance of {expected}, found {found}")]
    UnexpectedClass { expected: &'static str, found: String },

    #[error("Missing or mistyped field '{field}' in {class}")]
    MissingField { class: String, field: &'static str },
}

/// A deserialized value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    String(String),
    Object(Rc<Object>),
    Enum { class_name: String, constant: String },
    Class(Rc<ClassDesc>),
    /// `byte[]` contents are kept (and wiped on drop); they may be key material.
    ByteArray(Zeroizing<Vec<u8>>),
    /// Other primitive arrays are skipped; only their shape is kept.
    PrimitiveArray { type_code: u8, len: usize },
    ObjectArray(Vec<Value>),
    Primitive(Primitive),
}

impl Value {
    pub fn as_object(&self) -> Option<&Rc<Object>> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Primitive {
    Byte(i8),
    Char(u16),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDesc {
    pub name: String,
    pub serial_version_uid: u64,
    pub flags: u8,
    pub fields: Vec<FieldDesc>,
    pub super_class: Option<Rc<ClassDesc>>,
}

impl ClassDesc {
    /// Whether `name` is this class or one of its serializable ancestors.
    pub fn is_a(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(desc) = current {
            if desc.name == name {
                return true;
            }
            current = desc.super_class.as_deref();
        }
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDesc {
    pub type_code: u8,
    pub name: String,
    pub class_name: Option<String>,
}

/// Field values of one object, flattened across its class hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    pub class: Rc<ClassDesc>,
    pub fields: Vec<(String, Value)>,
}

impl Object {
    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    fn missing(&self, field: &'static str) -> SerialError {
        SerialError::MissingField {
            class: self.class.name.clone(),
            field,
        }
    }

    pub fn string_field(&self, field: &'static str) -> Result<&str, SerialError> {
        match self.field(field) {
            Some(Value::String(s)) => Ok(s.as_str()),
            _ => Err(self.missing(field)),
        }
    }

    pub fn bytes_field(&self, field: &'static str) -> Result<&[u8], SerialError> {
        match self.field(field) {
            Some(Value::ByteArray(bytes)) => Ok(bytes.as_slice()),
            _ => Err(self.missing(field)),
        }
    }

    /// Name of the enum constant held by `field`.
    pub fn enum_field(&self, field: &'static str) -> Result<&str, SerialError> {
        match self.field(field) {
            Some(Value::Enum { constant, .. }) => Ok(constant.as_str()),
            _ => Err(self.missing(field)),
        }
    }
}

#[derive(Debug)]
enum Handle {
    ClassDesc(Rc<ClassDesc>),
    Value(Value),
    /// Assigned but still being read; a reference to it is a cycle.
    Pending,
}

/// Read one stream (header plus a single top-level content) from `input`,
/// leaving the cursor just past it.
pub fn read_object(input: &mut ByteReader<'_>) -> Result<Value, SerialError> {
    let magic = input.read_u16()?;
    let version = input.read_u16()?;
    if magic != STREAM_MAGIC || version != STREAM_VERSION {
        return Err(SerialError::InvalidHeader { magic, version });
    }

    let mut stream = StreamReader {
        input,
        handles: Vec::new(),
        depth: 0,
    };
    stream.read_content()
}

struct StreamReader<'r, 'a> {
    input: &'r mut ByteReader<'a>,
    handles: Vec<Handle>,
    depth: usize,
}

impl StreamReader<'_, '_> {
    fn assign(&mut self, handle: Handle) -> usize {
        self.handles.push(handle);
        self.handles.len() - 1
    }

    fn lookup(&mut self) -> Result<(u32, &Handle), SerialError> {
        let raw = self.input.read_u32()?;
        let index = raw
            .checked_sub(BASE_WIRE_HANDLE)
            .ok_or(SerialError::UnknownHandle(raw))?;
        let handle = self
            .handles
            .get(index as usize)
            .ok_or(SerialError::UnknownHandle(raw))?;
        Ok((raw, handle))
    }

    fn unexpected(&self, code: u8) -> SerialError {
        SerialError::UnexpectedTypeCode {
            code,
            offset: self.input.position().saturating_sub(1),
        }
    }

    fn read_content(&mut self) -> Result<Value, SerialError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SerialError::TooDeep);
        }
        let result = self.read_content_inner();
        self.depth -= 1;
        result
    }

    fn read_content_inner(&mut self) -> Result<Value, SerialError> {
        match self.input.read_u8()? {
            TC_NULL => Ok(Value::Null),
            TC_REFERENCE => match self.lookup()? {
                (_, Handle::Value(value)) => Ok(value.clone()),
                (_, Handle::Pending) => Err(SerialError::Unsupported(
                    "back-reference to an object under construction",
                )),
                (handle, Handle::ClassDesc(_)) => Err(SerialError::HandleKindMismatch {
                    handle,
                    expected: "value",
                }),
            },
            TC_STRING => self.read_new_string(false).map(Value::String),
            TC_LONGSTRING => self.read_new_string(true).map(Value::String),
            TC_OBJECT => self.read_new_object(),
            TC_ARRAY => self.read_new_array(),
            TC_ENUM => self.read_new_enum(),
            TC_CLASS => {
                let desc = self
                    .read_class_desc()?
                    .ok_or(SerialError::Unsupported("null class literal"))?;
                let value = Value::Class(desc);
                self.assign(Handle::Value(value.clone()));
                Ok(value)
            }
            code => Err(self.unexpected(code)),
        }
    }

    fn read_new_string(&mut self, long: bool) -> Result<String, SerialError> {
        let s = if long {
            let len = self.input.read_u64()?;
            let len = usize::try_from(len).map_err(|_| {
                CodecError::LengthOverflow(i64::try_from(len).unwrap_or(i64::MAX))
            })?;
            let offset = self.input.position();
            codec::decode_modified_utf8(self.input.read_bytes(len)?, offset)?
        } else {
            self.input.read_utf()?
        };
        self.assign(Handle::Value(Value::String(s.clone())));
        Ok(s)
    }

    /// A string in a position that only admits strings (field type signatures,
    /// enum constant names).
    fn read_string(&mut self) -> Result<String, SerialError> {
        match self.input.read_u8()? {
            TC_STRING => self.read_new_string(false),
            TC_LONGSTRING => self.read_new_string(true),
            TC_REFERENCE => match self.lookup()? {
                (_, Handle::Value(Value::String(s))) => Ok(s.clone()),
                (handle, _) => Err(SerialError::HandleKindMismatch {
                    handle,
                    expected: "string",
                }),
            },
            code => Err(self.unexpected(code)),
        }
    }

    /// Super-class chains nest like content and count against the same limit.
    fn read_class_desc(&mut self) -> Result<Option<Rc<ClassDesc>>, SerialError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(SerialError::TooDeep);
        }
        let result = self.read_class_desc_inner();
        self.depth -= 1;
        result
    }

    fn read_class_desc_inner(&mut self) -> Result<Option<Rc<ClassDesc>>, SerialError> {
        match self.input.read_u8()? {
            TC_NULL => Ok(None),
            TC_REFERENCE => match self.lookup()? {
                (_, Handle::ClassDesc(desc)) => Ok(Some(Rc::clone(desc))),
                (handle, _) => Err(SerialError::HandleKindMismatch {
                    handle,
                    expected: "class descriptor",
                }),
            },
            TC_CLASSDESC => {
                // The descriptor's handle precedes the handles of its field type strings
                let index = self.assign(Handle::Pending);
                let name = self.input.read_utf()?;
                let serial_version_uid = self.input.read_u64()?;
                let flags = self.input.read_u8()?;
                let field_count = self.input.read_u16()?;

                let mut fields = Vec::with_capacity(usize::from(field_count).min(64));
                for _ in 0..field_count {
                    let type_code = self.input.read_u8()?;
                    let field_name = self.input.read_utf()?;
                    let class_name = match type_code {
                        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => None,
                        b'L' | b'[' => Some(self.read_string()?),
                        _ => return Err(SerialError::Unsupported("unknown field type code")),
                    };
                    fields.push(FieldDesc {
                        type_code,
                        name: field_name,
                        class_name,
                    });
                }

                self.skip_annotation()?;
                let super_class = self.read_class_desc()?;

                let desc = Rc::new(ClassDesc {
                    name,
                    serial_version_uid,
                    flags,
                    fields,
                    super_class,
                });
                self.handles[index] = Handle::ClassDesc(Rc::clone(&desc));
                Ok(Some(desc))
            }
            code => Err(self.unexpected(code)),
        }
    }

    /// Skip block data and objects up to the closing TC_ENDBLOCKDATA.
    fn skip_annotation(&mut self) -> Result<(), SerialError> {
        loop {
            match self.input.peek_u8()? {
                TC_ENDBLOCKDATA => {
                    self.input.read_u8()?;
                    return Ok(());
                }
                TC_BLOCKDATA => {
                    self.input.read_u8()?;
                    let len = self.input.read_u8()?;
                    self.input.read_bytes(usize::from(len))?;
                }
                TC_BLOCKDATALONG => {
                    self.input.read_u8()?;
                    self.input.read_length_prefixed()?;
                }
                _ => {
                    self.read_content()?;
                }
            }
        }
    }

    fn read_new_object(&mut self) -> Result<Value, SerialError> {
        let desc = self
            .read_class_desc()?
            .ok_or(SerialError::Unsupported("object without a class descriptor"))?;
        let index = self.assign(Handle::Pending);

        let mut hierarchy = Vec::new();
        let mut current = Some(Rc::clone(&desc));
        while let Some(class) = current {
            current = class.super_class.clone();
            hierarchy.push(class);
        }

        // Class data is written from the topmost serializable ancestor down
        let mut fields = Vec::new();
        for class in hierarchy.iter().rev() {
            if class.flags & SC_EXTERNALIZABLE != 0 {
                if class.flags & SC_BLOCK_DATA == 0 {
                    return Err(SerialError::Unsupported(
                        "externalizable class without block data",
                    ));
                }
                self.skip_annotation()?;
                continue;
            }
            if class.flags & SC_SERIALIZABLE == 0 {
                continue;
            }
            for field in &class.fields {
                let value = self.read_field_value(field.type_code)?;
                fields.push((field.name.clone(), value));
            }
            if class.flags & SC_WRITE_METHOD != 0 {
                self.skip_annotation()?;
            }
        }

        let value = Value::Object(Rc::new(Object {
            class: desc,
            fields,
        }));
        self.handles[index] = Handle::Value(value.clone());
        Ok(value)
    }

    fn read_field_value(&mut self, type_code: u8) -> Result<Value, SerialError> {
        let primitive = match type_code {
            b'B' => Primitive::Byte(i8::from_be_bytes([self.input.read_u8()?])),
            b'C' => Primitive::Char(self.input.read_u16()?),
            b'D' => Primitive::Double(f64::from_bits(self.input.read_u64()?)),
            b'F' => Primitive::Float(f32::from_bits(self.input.read_u32()?)),
            b'I' => Primitive::Int(self.input.read_i32()?),
            b'J' => Primitive::Long(self.input.read_i64()?),
            b'S' => Primitive::Short(i16::from_be_bytes(self.input.read_u16()?.to_be_bytes())),
            b'Z' => Primitive::Boolean(self.input.read_u8()? != 0),
            _ => return self.read_content(),
        };
        Ok(Value::Primitive(primitive))
    }

    fn read_new_array(&mut self) -> Result<Value, SerialError> {
        let desc = self
            .read_class_desc()?
            .ok_or(SerialError::Unsupported("array without a class descriptor"))?;
        let index = self.assign(Handle::Pending);

        let len = self.input.read_i32()?;
        let len = usize::try_from(len).map_err(|_| CodecError::LengthOverflow(i64::from(len)))?;

        let element = desc.name.as_bytes().get(1).copied().unwrap_or(0);
        let value = match element {
            b'B' => Value::ByteArray(Zeroizing::new(self.input.read_bytes(len)?.to_vec())),
            b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => {
                let width = match element {
                    b'Z' => 1,
                    b'C' | b'S' => 2,
                    b'F' | b'I' => 4,
                    _ => 8,
                };
                let total = len
                    .checked_mul(width)
                    .ok_or(CodecError::LengthOverflow(i64::MAX))?;
                self.input.read_bytes(total)?;
                Value::PrimitiveArray {
                    type_code: element,
                    len,
                }
            }
            b'L' | b'[' => {
                // Every element takes at least one byte
                if len > self.input.remaining() {
                    return Err(CodecError::UnexpectedEof {
                        offset: self.input.position(),
                        needed: len - self.input.remaining(),
                    }
                    .into());
                }
                let mut elements = Vec::with_capacity(len);
                for _ in 0..len {
                    elements.push(self.read_content()?);
                }
                Value::ObjectArray(elements)
            }
            _ => return Err(SerialError::Unsupported("array class name")),
        };

        self.handles[index] = Handle::Value(value.clone());
        Ok(value)
    }

    fn read_new_enum(&mut self) -> Result<Value, SerialError> {
        let desc = self
            .read_class_desc()?
            .ok_or(SerialError::Unsupported("enum without a class descriptor"))?;
        let index = self.assign(Handle::Pending);
        let constant = self.read_string()?;
        let value = Value::Enum {
            class_name: desc.name.clone(),
            constant,
        };
        self.handles[index] = Handle::Value(value.clone());
        Ok(value)
    }
}

/// Static description of a class the writer knows how to emit.
#[derive(Debug)]
pub struct ClassSpec {
    pub name: &'static str,
    pub serial_version_uid: u64,
    pub flags: u8,
    pub fields: &'static [FieldSpec],
    pub super_class: Option<&'static ClassSpec>,
}

/// One serializable field; reference fields carry their JVM type signature.
#[derive(Debug)]
pub struct FieldSpec {
    pub type_code: u8,
    pub name: &'static str,
    pub signature: &'static str,
}

impl FieldSpec {
    pub const fn string(name: &'static str) -> Self {
        Self {
            type_code: b'L',
            name,
            signature: "Ljava/lang/String;",
        }
    }

    pub const fn byte_array(name: &'static str) -> Self {
        Self {
            type_code: b'[',
            name,
            signature: "[B",
        }
    }
}

/// `byte[]`
pub static BYTE_ARRAY: ClassSpec = ClassSpec {
    name: "[B",
    serial_version_uid: 0xacf3_17f8_0608_54e0,
    flags: SC_SERIALIZABLE,
    fields: &[],
    super_class: None,
};

/// Emits a single-object stream. Type signature strings and class descriptors
/// are written once and back-referenced afterwards, like `ObjectOutputStream`.
pub struct ObjectWriter {
    out: Zeroizing<Vec<u8>>,
    next_handle: u32,
    type_strings: Vec<(&'static str, u32)>,
    classes: Vec<(&'static str, u32)>,
}

impl ObjectWriter {
    pub fn new() -> Self {
        let mut out = Zeroizing::new(Vec::with_capacity(256));
        out.extend_from_slice(&STREAM_MAGIC.to_be_bytes());
        out.extend_from_slice(&STREAM_VERSION.to_be_bytes());
        Self {
            out,
            next_handle: 0,
            type_strings: Vec::new(),
            classes: Vec::new(),
        }
    }

    fn assign(&mut self) -> u32 {
        let handle = BASE_WIRE_HANDLE + self.next_handle;
        self.next_handle += 1;
        handle
    }

    fn write_reference(&mut self, handle: u32) {
        self.out.push(TC_REFERENCE);
        self.out.extend_from_slice(&handle.to_be_bytes());
    }

    /// A string value. Each call writes a fresh string, as the JDK does for
    /// distinct `String` instances.
    pub fn write_string(&mut self, s: &str) -> Result<(), SerialError> {
        self.out.push(TC_STRING);
        codec::write_utf(&mut self.out, s)?;
        self.assign();
        Ok(())
    }

    fn write_type_string(&mut self, signature: &'static str) -> Result<(), SerialError> {
        if let Some(&(_, handle)) = self.type_strings.iter().find(|(s, _)| *s == signature) {
            self.write_reference(handle);
            return Ok(());
        }
        self.out.push(TC_STRING);
        codec::write_utf(&mut self.out, signature)?;
        let handle = self.assign();
        self.type_strings.push((signature, handle));
        Ok(())
    }

    fn write_class_desc(&mut self, spec: &'static ClassSpec) -> Result<(), SerialError> {
        if let Some(&(_, handle)) = self.classes.iter().find(|(name, _)| *name == spec.name) {
            self.write_reference(handle);
            return Ok(());
        }

        self.out.push(TC_CLASSDESC);
        let handle = self.assign();
        self.classes.push((spec.name, handle));

        codec::write_utf(&mut self.out, spec.name)?;
        self.out
            .extend_from_slice(&spec.serial_version_uid.to_be_bytes());
        self.out.push(spec.flags);
        let field_count = u16::try_from(spec.fields.len())
            .map_err(|_| SerialError::Unsupported("more than 65535 fields"))?;
        self.out.extend_from_slice(&field_count.to_be_bytes());
        for field in spec.fields {
            self.out.push(field.type_code);
            codec::write_utf(&mut self.out, field.name)?;
            self.write_type_string(field.signature)?;
        }
        self.out.push(TC_ENDBLOCKDATA);

        match spec.super_class {
            Some(super_class) => self.write_class_desc(super_class),
            None => {
                self.out.push(TC_NULL);
                Ok(())
            }
        }
    }

    /// Start a new object; its field values must follow in class-data order.
    pub fn begin_object(&mut self, spec: &'static ClassSpec) -> Result<(), SerialError> {
        self.out.push(TC_OBJECT);
        self.write_class_desc(spec)?;
        self.assign();
        Ok(())
    }

    pub fn write_byte_array(&mut self, bytes: &[u8]) -> Result<(), SerialError> {
        self.out.push(TC_ARRAY);
        self.write_class_desc(&BYTE_ARRAY)?;
        self.assign();
        codec::write_length_prefixed(&mut self.out, bytes)?;
        Ok(())
    }

    pub fn finish(self) -> Zeroizing<Vec<u8>> {
        self.out
    }
}

impl Default for ObjectWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    static POINT: ClassSpec = ClassSpec {
        name: "test.Point",
        serial_version_uid: 1,
        flags: SC_SERIALIZABLE,
        fields: &[FieldSpec::string("label"), FieldSpec::byte_array("payload")],
        super_class: None,
    };

    fn parse(bytes: &[u8]) -> Result<Value, SerialError> {
        read_object(&mut ByteReader::new(bytes))
    }

    #[test]
    fn test_writer_then_reader() {
        let mut writer = ObjectWriter::new();
        writer.begin_object(&POINT).unwrap();
        writer.write_string("origin").unwrap();
        writer.write_byte_array(&[9, 8, 7]).unwrap();
        let bytes = writer.finish();

        let value = parse(&bytes).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.class_name(), "test.Point");
        assert_eq!(object.class.serial_version_uid, 1);
        assert_eq!(object.string_field("label").unwrap(), "origin");
        assert_eq!(object.bytes_field("payload").unwrap(), &[9, 8, 7]);
        assert!(object.bytes_field("label").is_err());
    }

    #[test]
    fn test_repeated_type_strings_are_back_referenced() {
        static TWO_ARRAYS: ClassSpec = ClassSpec {
            name: "test.Pair",
            serial_version_uid: 2,
            flags: SC_SERIALIZABLE,
            fields: &[FieldSpec::byte_array("a"), FieldSpec::byte_array("b")],
            super_class: None,
        };

        let mut writer = ObjectWriter::new();
        writer.begin_object(&TWO_ARRAYS).unwrap();
        writer.write_byte_array(&[1]).unwrap();
        writer.write_byte_array(&[2]).unwrap();
        let bytes = writer.finish();

        // Second "[B" signature is TC_REFERENCE to handle 0x7e0001
        let second_field = hex!("5b 0001 62 71 007e0001");
        assert!(bytes.windows(second_field.len()).any(|w| w == second_field));
        // Second array reuses the [B class descriptor (handle 0x7e0003)
        let second_array = hex!("75 71 007e0003");
        assert!(bytes.windows(second_array.len()).any(|w| w == second_array));

        let value = parse(&bytes).unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.bytes_field("a").unwrap(), &[1]);
        assert_eq!(object.bytes_field("b").unwrap(), &[2]);
    }

    #[test]
    fn test_reads_enum_and_superclass_fields() {
        // class test.Child extends test.Base; Base { int n; } Child { test.Kind kind; }
        let stream = hex!(
            "aced0005"
            "73"                                    // TC_OBJECT
            "72 000a 746573742e4368696c64"          // "test.Child"
            "0000000000000003 02 0001"
            "4c 0004 6b696e64 74 000b 4c746573742f4b696e643b" // L kind "Ltest/Kind;"
            "78"
            "72 0009 746573742e42617365"            // super "test.Base"
            "0000000000000004 02 0001"
            "49 0001 6e"                            // I n
            "78 70"
            "0000002a"                              // Base.n = 42
            "7e"                                    // TC_ENUM
            "72 0009 746573742e4b696e64"            // "test.Kind"
            "0000000000000000 12 0000 78"
            "72 000e 6a6176612e6c616e672e456e756d"  // "java.lang.Enum"
            "0000000000000000 12 0000 78 70"
            "74 0006 534543524554"                  // "SECRET"
        );

        let value = parse(&stream).unwrap();
        let object = value.as_object().unwrap();
        assert!(object.class.is_a("test.Base"));
        assert!(!object.class.is_a("test.Other"));
        assert_eq!(
            object.field("n"),
            Some(&Value::Primitive(Primitive::Int(42)))
        );
        assert_eq!(object.enum_field("kind").unwrap(), "SECRET");
    }

    #[test]
    fn test_skips_write_method_annotations() {
        let stream = hex!(
            "aced0005 73"
            "72 0006 742e416e6e6f 0000000000000005 03 0000" // "t.Anno", SC_WRITE_METHOD | SC_SERIALIZABLE
            "78 70"
            "77 03 010203"                               // block data written by writeObject
            "74 0002 6869"                               // an extra object ("hi")
            "78"
        );
        let value = parse(&stream).unwrap();
        assert_eq!(value.as_object().unwrap().class_name(), "t.Anno");
    }

    #[test]
    fn test_rejects_bad_header() {
        assert_eq!(
            parse(&hex!("aced0004 70")),
            Err(SerialError::InvalidHeader {
                magic: 0xaced,
                version: 4
            })
        );
        assert!(parse(&hex!("cafe0005 70")).is_err());
    }

    #[test]
    fn test_rejects_dangling_reference() {
        assert_eq!(
            parse(&hex!("aced0005 71 007e0009")),
            Err(SerialError::UnknownHandle(0x7e0009))
        );
    }

    #[test]
    fn test_rejects_truncated_array() {
        let stream = hex!("aced0005 75 72 0002 5b42 acf317f8060854e0 02 0000 78 70 00000010 0102");
        assert!(matches!(
            parse(&stream),
            Err(SerialError::Codec(CodecError::UnexpectedEof { .. }))
        ));
    }

    #[test]
    fn test_depth_limit() {
        // Nested Object[] arrays: [ [ [ ... ] ] ]
        let mut stream = hex!("aced0005").to_vec();
        stream.extend_from_slice(&hex!(
            "75 72 0013 5b4c6a6176612e6c616e672e4f626a6563743b 90ce589f1073296c 02 0000 78 70 00000001"
        ));
        for _ in 0..MAX_DEPTH {
            stream.extend_from_slice(&hex!("75 71 007e0000 00000001"));
        }
        stream.push(TC_NULL);
        assert_eq!(parse(&stream), Err(SerialError::TooDeep));
    }

    #[test]
    fn test_super_class_chain_depth_limit() {
        let mut stream = hex!("aced0005 73").to_vec();
        for _ in 0..=MAX_DEPTH {
            stream.extend_from_slice(&hex!("72 0001 41 0000000000000001 02 0000 78"));
        }
        stream.push(TC_NULL);
        assert_eq!(parse(&stream), Err(SerialError::TooDeep));
    }

    #[test]
    fn test_super_class_chain_within_limit() {
        let stream = hex!(
            "aced0005 73"
            "72 0001 41 0000000000000001 02 0000 78"
            "72 0001 42 0000000000000002 02 0000 78"
            "70"
        );
        let value = parse(&stream).unwrap();
        assert_eq!(value.as_object().unwrap().class_name(), "A");
    }
}
