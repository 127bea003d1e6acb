use nalgebra::Point3;
use std::fmt;
use std::str::FromStr;

pub type Point = Point3<f64>;

/// Chemical elements commonly encountered in macromolecular coordinate files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Element {
    H = 1,
    C = 6,
    N = 7,
    O = 8,
    F = 9,
    Na = 11,
    Mg = 12,
    P = 15,
    S = 16,
    Cl = 17,
    K = 19,
    Ca = 20,
    Mn = 25,
    Fe = 26,
    Co = 27,
    Ni = 28,
    Cu = 29,
    Zn = 30,
    Se = 34,
    Br = 35,
    I = 53,
    Unknown = 0,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardResidue {
    ALA,
    ARG,
    ASN,
    ASP,
    CYS,
    GLN,
    GLU,
    GLY,
    HIS,
    ILE,
    LEU,
    LYS,
    MET,
    PHE,
    PRO,
    SER,
    THR,
    TRP,
    TYR,
    VAL,
    A,
    C,
    G,
    U,
    I,
    DA,
    DC,
    DG,
    DT,
    DI,
    HOH,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResidueCategory {
    Standard,
    Hetero,
    Ion,
}

impl ResidueCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ResidueCategory::Standard => "Standard Residue",
            ResidueCategory::Hetero => "Hetero Residue",
            ResidueCategory::Ion => "Ion",
        }
    }
}

impl fmt::Display for ResidueCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Element {
    pub fn symbol(&self) -> &'static str {
        match self {
            Element::H => "H",
            Element::C => "C",
            Element::N => "N",
            Element::O => "O",
            Element::F => "F",
            Element::Na => "Na",
            Element::Mg => "Mg",
            Element::P => "P",
            Element::S => "S",
            Element::Cl => "Cl",
            Element::K => "K",
            Element::Ca => "Ca",
            Element::Mn => "Mn",
            Element::Fe => "Fe",
            Element::Co => "Co",
            Element::Ni => "Ni",
            Element::Cu => "Cu",
            Element::Zn => "Zn",
            Element::Se => "Se",
            Element::Br => "Br",
            Element::I => "I",
            Element::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Element {
    type Err = String;

    /// Parses element symbols case-insensitively; unrecognized input maps to
    /// [`Element::Unknown`] instead of failing.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let element = match s.trim().to_ascii_uppercase().as_str() {
            "H" | "D" => Element::H,
            "C" => Element::C,
            "N" => Element::N,
            "O" => Element::O,
            "F" => Element::F,
            "NA" => Element::Na,
            "MG" => Element::Mg,
            "P" => Element::P,
            "S" => Element::S,
            "CL" => Element::Cl,
            "K" => Element::K,
            "CA" => Element::Ca,
            "MN" => Element::Mn,
            "FE" => Element::Fe,
            "CO" => Element::Co,
            "NI" => Element::Ni,
            "CU" => Element::Cu,
            "ZN" => Element::Zn,
            "SE" => Element::Se,
            "BR" => Element::Br,
            "I" => Element::I,
            _ => Element::Unknown,
        };
        Ok(element)
    }
}

impl StandardResidue {
    pub fn is_protein(&self) -> bool {
        matches!(
            self,
            StandardResidue::ALA
                | StandardResidue::ARG
                | StandardResidue::ASN
                | StandardResidue::ASP
                | StandardResidue::CYS
                | StandardResidue::GLN
                | StandardResidue::GLU
                | StandardResidue::GLY
                | StandardResidue::HIS
                | StandardResidue::ILE
                | StandardResidue::LEU
                | StandardResidue::LYS
                | StandardResidue::MET
                | StandardResidue::PHE
                | StandardResidue::PRO
                | StandardResidue::SER
                | StandardResidue::THR
                | StandardResidue::TRP
                | StandardResidue::TYR
                | StandardResidue::VAL
        )
    }

    pub fn is_nucleic(&self) -> bool {
        matches!(
            self,
            StandardResidue::A
                | StandardResidue::C
                | StandardResidue::G
                | StandardResidue::U
                | StandardResidue::I
                | StandardResidue::DA
                | StandardResidue::DC
                | StandardResidue::DG
                | StandardResidue::DT
                | StandardResidue::DI
        )
    }

    pub fn is_polymer(&self) -> bool {
        self.is_protein() || self.is_nucleic()
    }
}

impl fmt::Display for StandardResidue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let code = match self {
            StandardResidue::ALA => "ALA",
            StandardResidue::ARG => "ARG",
            StandardResidue::ASN => "ASN",
            StandardResidue::ASP => "ASP",
            StandardResidue::CYS => "CYS",
            StandardResidue::GLN => "GLN",
            StandardResidue::GLU => "GLU",
            StandardResidue::GLY => "GLY",
            StandardResidue::HIS => "HIS",
            StandardResidue::ILE => "ILE",
            StandardResidue::LEU => "LEU",
            StandardResidue::LYS => "LYS",
            StandardResidue::MET => "MET",
            StandardResidue::PHE => "PHE",
            StandardResidue::PRO => "PRO",
            StandardResidue::SER => "SER",
            StandardResidue::THR => "THR",
            StandardResidue::TRP => "TRP",
            StandardResidue::TYR => "TYR",
            StandardResidue::VAL => "VAL",
            StandardResidue::A => "A",
            StandardResidue::C => "C",
            StandardResidue::G => "G",
            StandardResidue::U => "U",
            StandardResidue::I => "I",
            StandardResidue::DA => "DA",
            StandardResidue::DC => "DC",
            StandardResidue::DG => "DG",
            StandardResidue::DT => "DT",
            StandardResidue::DI => "DI",
            StandardResidue::HOH => "HOH",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for StandardResidue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ALA" => Ok(StandardResidue::ALA),
            "ARG" => Ok(StandardResidue::ARG),
            "ASN" => Ok(StandardResidue::ASN),
            "ASP" => Ok(StandardResidue::ASP),
            "CYS" => Ok(StandardResidue::CYS),
            "GLN" => Ok(StandardResidue::GLN),
            "GLU" => Ok(StandardResidue::GLU),
            "GLY" => Ok(StandardResidue::GLY),
            "HIS" => Ok(StandardResidue::HIS),
            "ILE" => Ok(StandardResidue::ILE),
            "LEU" => Ok(StandardResidue::LEU),
            "LYS" => Ok(StandardResidue::LYS),
            "MET" => Ok(StandardResidue::MET),
            "PHE" => Ok(StandardResidue::PHE),
            "PRO" => Ok(StandardResidue::PRO),
            "SER" => Ok(StandardResidue::SER),
            "THR" => Ok(StandardResidue::THR),
            "TRP" => Ok(StandardResidue::TRP),
            "TYR" => Ok(StandardResidue::TYR),
            "VAL" => Ok(StandardResidue::VAL),
            "A" => Ok(StandardResidue::A),
            "C" => Ok(StandardResidue::C),
            "G" => Ok(StandardResidue::G),
            "U" => Ok(StandardResidue::U),
            "I" => Ok(StandardResidue::I),
            "DA" => Ok(StandardResidue::DA),
            "DC" => Ok(StandardResidue::DC),
            "DG" => Ok(StandardResidue::DG),
            "DT" => Ok(StandardResidue::DT),
            "DI" => Ok(StandardResidue::DI),
            "HOH" => Ok(StandardResidue::HOH),
            _ => Err(format!("Invalid standard residue: {}", s)),
        }
    }
}
