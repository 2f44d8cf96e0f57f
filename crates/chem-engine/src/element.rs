//! Tabla periódica para el parser SMILES.

/// Símbolos indexados por número atómico - 1 (H..Og).
static SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y",
    "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce",
    "Pr", "Nd", "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir",
    "Pt", "Au", "Hg", "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn", "Nh", "Fl", "Mc",
    "Lv", "Ts", "Og",
];

/// Número atómico de un símbolo con mayúscula inicial (`"Cl"`, `"Se"`).
pub fn atomic_number(symbol: &str) -> Option<u8> {
    SYMBOLS.iter().position(|s| *s == symbol).map(|i| (i + 1) as u8)
}

/// Símbolo de un número atómico (`"*"` para 0).
pub fn symbol(atomic_number: u8) -> &'static str {
    match atomic_number {
        0 => "*",
        z => SYMBOLS.get(z as usize - 1).copied().unwrap_or("?"),
    }
}

/// Valencias permitidas para el subset orgánico, en orden creciente.
pub fn organic_valences(atomic_number: u8) -> Option<&'static [u8]> {
    match atomic_number {
        5 => Some(&[3]),
        6 => Some(&[4]),
        7 => Some(&[3, 5]),
        8 => Some(&[2]),
        15 => Some(&[3, 5]),
        16 => Some(&[2, 4, 6]),
        9 => Some(&[1]),
        17 | 35 | 53 => Some(&[1]),
        _ => None,
    }
}

/// Elementos que pueden escribirse en minúscula (aromáticos) en SMILES.
pub fn can_be_aromatic(atomic_number: u8) -> bool {
    matches!(atomic_number, 0 | 5 | 6 | 7 | 8 | 15 | 16 | 33 | 34 | 52)
}
