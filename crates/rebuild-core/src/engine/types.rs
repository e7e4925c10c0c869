//! Coded values reported by the native engine.

/// File type codes returned by `GWDetermineFileTypeFromFileInMem`.
///
/// Codes the engine reports that are not listed here resolve to [`FileType::Unknown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Unknown,
    FileIssues,
    BufferIssues,
    InternalIssues,
    LicenseExpired,
    PasswordProtectedOpcFile,
    NullPointerArgument,
    Pdf,
    Doc,
    Docx,
    Ppt,
    Pptx,
    Xls,
    Xlsx,
    Png,
    Jpeg,
    Gif,
    Emf,
    Wmf,
    Rtf,
    Bmp,
    Tiff,
    Pe,
    Macho,
    Elf,
    Mp4,
    Mp3,
    Mp2,
    Wav,
    Mpg,
    Coff,
}

/// Name of the reserved "could not detect" type.
pub const UNKNOWN_FILE_TYPE: &str = "Unknown";

impl FileType {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => FileType::FileIssues,
            2 => FileType::BufferIssues,
            3 => FileType::InternalIssues,
            4 => FileType::LicenseExpired,
            5 => FileType::PasswordProtectedOpcFile,
            6 => FileType::NullPointerArgument,
            16 => FileType::Pdf,
            17 => FileType::Doc,
            18 => FileType::Docx,
            19 => FileType::Ppt,
            20 => FileType::Pptx,
            21 => FileType::Xls,
            22 => FileType::Xlsx,
            23 => FileType::Png,
            24 => FileType::Jpeg,
            25 => FileType::Gif,
            26 => FileType::Emf,
            27 => FileType::Wmf,
            28 => FileType::Rtf,
            29 => FileType::Bmp,
            30 => FileType::Tiff,
            31 => FileType::Pe,
            32 => FileType::Macho,
            33 => FileType::Elf,
            34 => FileType::Mp4,
            35 => FileType::Mp3,
            36 => FileType::Mp2,
            37 => FileType::Wav,
            38 => FileType::Mpg,
            39 => FileType::Coff,
            _ => FileType::Unknown,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            FileType::Unknown => 0,
            FileType::FileIssues => 1,
            FileType::BufferIssues => 2,
            FileType::InternalIssues => 3,
            FileType::LicenseExpired => 4,
            FileType::PasswordProtectedOpcFile => 5,
            FileType::NullPointerArgument => 6,
            FileType::Pdf => 16,
            FileType::Doc => 17,
            FileType::Docx => 18,
            FileType::Ppt => 19,
            FileType::Pptx => 20,
            FileType::Xls => 21,
            FileType::Xlsx => 22,
            FileType::Png => 23,
            FileType::Jpeg => 24,
            FileType::Gif => 25,
            FileType::Emf => 26,
            FileType::Wmf => 27,
            FileType::Rtf => 28,
            FileType::Bmp => 29,
            FileType::Tiff => 30,
            FileType::Pe => 31,
            FileType::Macho => 32,
            FileType::Elf => 33,
            FileType::Mp4 => 34,
            FileType::Mp3 => 35,
            FileType::Mp2 => 36,
            FileType::Wav => 37,
            FileType::Mpg => 38,
            FileType::Coff => 39,
        }
    }

    /// Name passed back to the engine on rebuild and reported in `gw-file-type`.
    pub fn name(self) -> &'static str {
        match self {
            FileType::Unknown => UNKNOWN_FILE_TYPE,
            FileType::FileIssues => "FileIssues",
            FileType::BufferIssues => "BufferIssues",
            FileType::InternalIssues => "InternalIssues",
            FileType::LicenseExpired => "LicenseExpired",
            FileType::PasswordProtectedOpcFile => "PasswordProtectedOpcFile",
            FileType::NullPointerArgument => "NullPointerArgument",
            FileType::Pdf => "Pdf",
            FileType::Doc => "Doc",
            FileType::Docx => "Docx",
            FileType::Ppt => "Ppt",
            FileType::Pptx => "Pptx",
            FileType::Xls => "Xls",
            FileType::Xlsx => "Xlsx",
            FileType::Png => "Png",
            FileType::Jpeg => "Jpeg",
            FileType::Gif => "Gif",
            FileType::Emf => "Emf",
            FileType::Wmf => "Wmf",
            FileType::Rtf => "Rtf",
            FileType::Bmp => "Bmp",
            FileType::Tiff => "Tiff",
            FileType::Pe => "Pe",
            FileType::Macho => "Macho",
            FileType::Elf => "Elf",
            FileType::Mp4 => "Mp4",
            FileType::Mp3 => "Mp3",
            FileType::Mp2 => "Mp2",
            FileType::Wav => "Wav",
            FileType::Mpg => "Mpg",
            FileType::Coff => "Coff",
        }
    }
}

/// Status code returned by configuration and rebuild entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOutcome {
    Error,
    Success,
    Other(i32),
}

impl EngineOutcome {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => EngineOutcome::Error,
            1 => EngineOutcome::Success,
            other => EngineOutcome::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            EngineOutcome::Error => 0,
            EngineOutcome::Success => 1,
            EngineOutcome::Other(c) => c,
        }
    }

    pub fn is_success(self) -> bool {
        self == EngineOutcome::Success
    }

    pub fn name(self) -> String {
        match self {
            EngineOutcome::Error => "Error".to_string(),
            EngineOutcome::Success => "Success".to_string(),
            EngineOutcome::Other(c) => format!("Unrecognised({c})"),
        }
    }
}
