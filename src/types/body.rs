//! BODYSTRUCTURE data (RFC 3501 section 7.4.2).

use crate::types::{
    core::{NString, Vec1},
    envelope::Envelope,
};

/// The parsed MIME structure of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyStructure {
    /// `body-type-1part`
    Single {
        body: Body,
        /// Present only in extensible BODYSTRUCTURE responses.
        extension_data: Option<SinglePartExtensionData>,
    },
    /// `body-type-mpart`
    Multi {
        bodies: Vec1<BodyStructure>,
        subtype: NString,
        extension_data: Option<MultiPartExtensionData>,
    },
}

/// One non-multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub basic: BasicFields,
    pub specific: SpecificFields,
}

/// `body-fields`, common to all single-part bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicFields {
    /// `("name" "value" ...)` or empty for `NIL`.
    pub parameter_list: Vec<(NString, NString)>,
    pub id: NString,
    pub description: NString,
    pub content_transfer_encoding: NString,
    pub size: u32,
}

/// What makes a body a TEXT, MESSAGE/RFC822, or basic body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecificFields {
    /// Any `type/subtype` other than TEXT and MESSAGE/RFC822.
    Basic {
        r#type: NString,
        subtype: NString,
    },
    /// `MESSAGE/RFC822`: carries the nested envelope and structure.
    Message {
        envelope: Box<Envelope>,
        body_structure: Box<BodyStructure>,
        number_of_lines: u32,
    },
    /// `TEXT/<subtype>`.
    Text {
        subtype: NString,
        number_of_lines: u32,
    },
}

/// `body-ext-1part`: MD5, disposition, language, location, and whatever the
/// server appends after that.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SinglePartExtensionData {
    pub md5: NString,
    pub disposition: Option<Disposition>,
    pub language: Vec<NString>,
    pub location: NString,
    pub extensions: Vec<BodyExtension>,
}

/// `body-ext-mpart`: parameter list, then the same tail as single parts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MultiPartExtensionData {
    pub parameter_list: Vec<(NString, NString)>,
    pub disposition: Option<Disposition>,
    pub language: Vec<NString>,
    pub location: NString,
    pub extensions: Vec<BodyExtension>,
}

/// `body-fld-dsp`, e.g., `("attachment" ("filename" "x.pdf"))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disposition {
    pub kind: NString,
    pub parameter_list: Vec<(NString, NString)>,
}

/// `body-extension`: free-form nested extension data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyExtension {
    NString(NString),
    Number(u32),
    List(Vec1<BodyExtension>),
}
