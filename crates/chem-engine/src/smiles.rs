//! Parser SMILES nativo.
//!
//! Cubre el subset que aparece en bibliotecas de productos naturales: átomos
//! del subset orgánico y entre corchetes, ramas, cierres de anillo (`0-9` y
//! `%nn`), órdenes de enlace explícitos y fragmentos separados por `.`.
//! La estereoquímica se acepta pero se descarta.

use std::collections::BTreeMap;

use crate::element;
use crate::graph::{Atom, Bond, BondOrder, MolecularGraph};
use crate::{EngineError, StructureParser};

/// Implementación por defecto de `StructureParser`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmilesParser;

impl StructureParser for SmilesParser {
    fn parse(&self, notation: &str) -> Result<MolecularGraph, EngineError> {
        parse_smiles(notation)
    }
}

/// Parsea un SMILES a un grafo validado.
pub fn parse_smiles(smiles: &str) -> Result<MolecularGraph, EngineError> {
    let trimmed = smiles.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Empty);
    }
    let mut reader = Reader::new(trimmed);
    reader.read()?;
    reader.finish()?;
    reader.assign_hydrogens()?;
    let graph = MolecularGraph::new(reader.atoms, reader.bonds);
    check_aromatic_rings(&graph)?;
    Ok(graph)
}

// |carga| máxima aceptada en un átomo entre corchetes
const MAX_CHARGE: u32 = 15;

#[derive(Debug, Clone, Copy)]
struct PendingBond {
    order: BondOrder,
    position: usize,
}

struct RingOpening {
    atom: usize,
    bond: Option<PendingBond>,
    position: usize,
}

struct Reader<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<Atom>,
    // true si el átomo se escribió entre corchetes (H explícitos)
    bracketed: Vec<bool>,
    bonds: Vec<Bond>,
    rings: BTreeMap<u16, RingOpening>,
    // (átomo raíz de la rama, átomos existentes al abrirla)
    branches: Vec<(usize, usize)>,
    prev: Option<usize>,
    pending: Option<PendingBond>,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input: input.as_bytes(),
               pos: 0,
               atoms: Vec::new(),
               bracketed: Vec::new(),
               bonds: Vec::new(),
               rings: BTreeMap::new(),
               branches: Vec::new(),
               prev: None,
               pending: None }
    }

    fn error(&self, position: usize, message: impl Into<String>) -> EngineError {
        EngineError::Parse { position, message: message.into() }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let ch = self.peek();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn read(&mut self) -> Result<(), EngineError> {
        while let Some(ch) = self.peek() {
            let at = self.pos;
            match ch {
                b'(' => {
                    self.bump();
                    let root = self.prev.ok_or_else(|| self.error(at, "rama sin átomo previo"))?;
                    if self.pending.is_some() {
                        return Err(self.error(at, "enlace antes de abrir rama"));
                    }
                    self.branches.push((root, self.atoms.len()));
                }
                b')' => {
                    self.bump();
                    let (root, atoms_at_open) = self.branches.pop().ok_or_else(|| self.error(at, "')' sin '(' previo"))?;
                    if self.pending.is_some() {
                        return Err(self.error(at, "enlace colgante al cerrar rama"));
                    }
                    if self.atoms.len() == atoms_at_open {
                        return Err(self.error(at, "rama vacía"));
                    }
                    self.prev = Some(root);
                }
                b'-' | b'=' | b'#' | b'$' | b':' | b'/' | b'\\' => {
                    self.bump();
                    if self.prev.is_none() {
                        return Err(self.error(at, "enlace sin átomo previo"));
                    }
                    if self.pending.is_some() {
                        return Err(self.error(at, "dos símbolos de enlace consecutivos"));
                    }
                    let order = match ch {
                        b'=' => BondOrder::Double,
                        b'#' => BondOrder::Triple,
                        b'$' => BondOrder::Quadruple,
                        b':' => BondOrder::Aromatic,
                        _ => BondOrder::Single,
                    };
                    self.pending = Some(PendingBond { order, position: at });
                }
                b'.' => {
                    self.bump();
                    if self.prev.is_none() || self.pending.is_some() {
                        return Err(self.error(at, "separador de fragmento mal ubicado"));
                    }
                    self.prev = None;
                }
                b'%' => {
                    self.bump();
                    let number = self.read_two_digit_ring(at)?;
                    self.ring_closure(number, at)?;
                }
                b'0'..=b'9' => {
                    self.bump();
                    self.ring_closure((ch - b'0') as u16, at)?;
                }
                b'[' => self.read_bracket_atom()?,
                b'*' | b'B' | b'C' | b'N' | b'O' | b'P' | b'S' | b'F' | b'I' | b'b' | b'c' | b'n' | b'o' | b'p'
                | b's' => self.read_organic_atom()?,
                other => {
                    return Err(self.error(at, format!("carácter inesperado '{}'", other as char)));
                }
            }
        }
        Ok(())
    }

    fn finish(&self) -> Result<(), EngineError> {
        if let Some(p) = self.pending {
            return Err(self.error(p.position, "enlace colgante al final"));
        }
        if let Some(&(root, _)) = self.branches.last() {
            return Err(self.error(self.input.len(), format!("rama abierta sin cerrar desde el átomo {root}")));
        }
        if let Some((number, open)) = self.rings.iter().next() {
            return Err(self.error(open.position, format!("cierre de anillo {number} sin pareja")));
        }
        if self.prev.is_none() {
            return Err(self.error(self.input.len(), "SMILES termina en separador de fragmento"));
        }
        Ok(())
    }

    fn read_organic_atom(&mut self) -> Result<(), EngineError> {
        let at = self.pos;
        let ch = self.bump().ok_or_else(|| self.error(at, "fin inesperado"))?;
        let (symbol, aromatic) = match ch {
            b'*' => ("*", false),
            b'B' if self.peek() == Some(b'r') => {
                self.bump();
                ("Br", false)
            }
            b'C' if self.peek() == Some(b'l') => {
                self.bump();
                ("Cl", false)
            }
            b'B' => ("B", false),
            b'C' => ("C", false),
            b'N' => ("N", false),
            b'O' => ("O", false),
            b'P' => ("P", false),
            b'S' => ("S", false),
            b'F' => ("F", false),
            b'I' => ("I", false),
            b'b' => ("B", true),
            b'c' => ("C", true),
            b'n' => ("N", true),
            b'o' => ("O", true),
            b'p' => ("P", true),
            b's' => ("S", true),
            other => return Err(self.error(at, format!("átomo orgánico desconocido '{}'", other as char))),
        };
        let atomic_number = if symbol == "*" {
            0
        } else {
            element::atomic_number(symbol).ok_or_else(|| self.error(at, format!("elemento desconocido '{symbol}'")))?
        };
        let atom = Atom { atomic_number, formal_charge: 0, isotope: None, aromatic, hydrogens: 0 };
        self.push_atom(atom, false, at)
    }

    fn read_bracket_atom(&mut self) -> Result<(), EngineError> {
        let open = self.pos;
        self.bump(); // '['

        let isotope = match self.read_number() {
            Some(n) => Some(u16::try_from(n).map_err(|_| self.error(open + 1, format!("isótopo fuera de rango ({n})")))?),
            None => None,
        };

        let at = self.pos;
        let first = self.bump().ok_or_else(|| self.error(at, "átomo entre corchetes incompleto"))?;
        let (atomic_number, aromatic) = match first {
            b'*' => (0, false),
            c if c.is_ascii_uppercase() => {
                let one = (c as char).to_string();
                let two = self.peek().filter(u8::is_ascii_lowercase).map(|n| format!("{}{}", c as char, n as char));
                match two.as_deref().and_then(element::atomic_number) {
                    Some(z) => {
                        self.bump();
                        (z, false)
                    }
                    None => {
                        let z = element::atomic_number(&one)
                            .ok_or_else(|| self.error(at, format!("elemento desconocido '{one}'")))?;
                        (z, false)
                    }
                }
            }
            c if c.is_ascii_lowercase() => {
                let two = self.peek().filter(u8::is_ascii_lowercase).map(|n| [c, n]);
                let symbol = match two {
                    Some(pair) if matches!(&pair, b"se" | b"as" | b"te") => {
                        self.bump();
                        let s = std::str::from_utf8(&pair).unwrap_or_default();
                        capitalize(s)
                    }
                    _ => capitalize(&(c as char).to_string()),
                };
                let z = element::atomic_number(&symbol)
                    .filter(|&z| element::can_be_aromatic(z))
                    .ok_or_else(|| self.error(at, format!("símbolo aromático no válido '{}'", symbol.to_lowercase())))?;
                (z, true)
            }
            other => return Err(self.error(at, format!("carácter inesperado '{}' en corchetes", other as char))),
        };

        self.skip_chirality();

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.bump();
            hydrogens = match self.peek() {
                Some(d) if d.is_ascii_digit() => {
                    self.bump();
                    d - b'0'
                }
                _ => 1,
            };
        }

        let formal_charge = self.read_charge()?;

        // clase de átomo (`:n`), se descarta
        if self.peek() == Some(b':') {
            self.bump();
            if self.read_number().is_none() {
                return Err(self.error(self.pos, "clase de átomo sin número"));
            }
        }

        if self.bump() != Some(b']') {
            return Err(self.error(open, "falta ']' en átomo entre corchetes"));
        }

        let atom = Atom { atomic_number, formal_charge, isotope, aromatic, hydrogens };
        self.push_atom(atom, true, open)
    }

    fn skip_chirality(&mut self) {
        if self.peek() != Some(b'@') {
            return;
        }
        while self.peek() == Some(b'@') {
            self.bump();
        }
        // formas extendidas: @TH1, @AL2, @SP3, @TB12, @OH20
        let tag: &[u8] = self.input.get(self.pos..self.pos + 2).unwrap_or_default();
        if matches!(tag, b"TH" | b"AL" | b"SP" | b"TB" | b"OH") {
            self.pos += 2;
            let _ = self.read_number();
        }
    }

    fn read_charge(&mut self) -> Result<i8, EngineError> {
        let at = self.pos;
        let sign: i8 = match self.peek() {
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Ok(0),
        };
        let symbol = if sign > 0 { b'+' } else { b'-' };
        self.bump();
        let magnitude = match self.read_number() {
            Some(n) => n,
            None => {
                let mut repeated = 1u32;
                while self.peek() == Some(symbol) {
                    self.bump();
                    repeated = repeated.saturating_add(1);
                }
                repeated
            }
        };
        if magnitude > MAX_CHARGE {
            return Err(self.error(at, format!("carga formal fuera de rango ({magnitude})")));
        }
        Ok(sign * magnitude as i8)
    }

    fn read_number(&mut self) -> Option<u32> {
        let start = self.pos;
        let mut n: u32 = 0;
        while let Some(d) = self.peek().filter(u8::is_ascii_digit) {
            self.bump();
            n = n.saturating_mul(10).saturating_add((d - b'0') as u32);
        }
        (self.pos > start).then_some(n)
    }

    fn read_two_digit_ring(&mut self, at: usize) -> Result<u16, EngineError> {
        let digits = self.input.get(self.pos..self.pos + 2).filter(|d| d.iter().all(u8::is_ascii_digit));
        match digits {
            Some(d) => {
                let n = (d[0] - b'0') as u16 * 10 + (d[1] - b'0') as u16;
                self.pos += 2;
                Ok(n)
            }
            None => Err(self.error(at, "se esperaban dos dígitos tras '%'")),
        }
    }

    fn push_atom(&mut self, atom: Atom, bracketed: bool, at: usize) -> Result<(), EngineError> {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        self.bracketed.push(bracketed);
        if let Some(prev) = self.prev {
            let pending = self.pending.take();
            self.add_bond(prev, idx, pending, at)?;
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn ring_closure(&mut self, number: u16, at: usize) -> Result<(), EngineError> {
        let current = self.prev.ok_or_else(|| self.error(at, "cierre de anillo sin átomo previo"))?;
        let pending = self.pending.take();
        match self.rings.remove(&number) {
            Some(open) => {
                if open.atom == current {
                    return Err(self.error(at, format!("cierre de anillo {number} sobre el mismo átomo")));
                }
                let bond = match (open.bond, pending) {
                    (Some(a), Some(b)) if a.order != b.order => {
                        return Err(self.error(at, format!("órdenes de enlace en conflicto en el anillo {number}")));
                    }
                    (a, b) => b.or(a),
                };
                self.add_bond(open.atom, current, bond, at)
            }
            None => {
                self.rings.insert(number, RingOpening { atom: current, bond: pending, position: at });
                Ok(())
            }
        }
    }

    fn add_bond(&mut self, a: usize, b: usize, pending: Option<PendingBond>, at: usize) -> Result<(), EngineError> {
        let duplicate = self.bonds.iter().any(|bd| (bd.begin == a && bd.end == b) || (bd.begin == b && bd.end == a));
        if duplicate {
            return Err(self.error(at, format!("enlace duplicado entre los átomos {a} y {b}")));
        }
        let both_aromatic = self.atoms[a].aromatic && self.atoms[b].aromatic;
        // un `-` explícito entre aromáticos produce enlace simple (bifenilo)
        let order = match pending {
            Some(p) => p.order,
            None if both_aromatic => BondOrder::Aromatic,
            None => BondOrder::Single,
        };
        self.bonds.push(Bond { begin: a, end: b, order });
        Ok(())
    }

    /// Hidrógenos implícitos y validación de valencia para el subset orgánico.
    fn assign_hydrogens(&mut self) -> Result<(), EngineError> {
        let mut used = vec![0u8; self.atoms.len()];
        for bond in &self.bonds {
            used[bond.begin] = used[bond.begin].saturating_add(bond.order.valence());
            used[bond.end] = used[bond.end].saturating_add(bond.order.valence());
        }
        for (idx, atom) in self.atoms.iter_mut().enumerate() {
            if self.bracketed[idx] {
                continue;
            }
            let Some(valences) = element::organic_valences(atom.atomic_number) else {
                continue;
            };
            let lowest = valences[0];
            let mut demand = used[idx];
            // un aromático aporta un electrón pi salvo que ya no le quepa
            // (pirrol-N, furano-O, tiofeno-S donan el par libre)
            if atom.aromatic && demand < lowest {
                demand += 1;
            }
            match valences.iter().find(|&&v| v >= demand) {
                Some(&v) => atom.hydrogens = v - demand,
                None => {
                    return Err(EngineError::Valence { atom: idx,
                                                      symbol: element::symbol(atom.atomic_number).to_string() })
                }
            }
        }
        Ok(())
    }
}

fn check_aromatic_rings(graph: &MolecularGraph) -> Result<(), EngineError> {
    let ring_atoms = graph.ring_atoms();
    match graph.atoms().iter().enumerate().find(|(i, a)| a.aromatic && !ring_atoms[*i]) {
        Some((atom, _)) => Err(EngineError::Aromaticity { atom }),
        None => Ok(()),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrogens(smiles: &str) -> Vec<u8> {
        parse_smiles(smiles).unwrap().atoms().iter().map(|a| a.hydrogens).collect()
    }

    #[test]
    fn parse_methane_single_atom() {
        let g = parse_smiles("C").unwrap();
        assert_eq!(g.atom_count(), 1);
        assert_eq!(g.bond_count(), 0);
        assert_eq!(g.atoms()[0].hydrogens, 4);
    }

    #[test]
    fn parse_ethanol_implicit_hydrogens() {
        assert_eq!(hydrogens("CCO"), vec![3, 2, 1]);
    }

    #[test]
    fn parse_benzene_aromatic_ring() {
        let g = parse_smiles("c1ccccc1").unwrap();
        assert_eq!(g.atom_count(), 6);
        assert_eq!(g.bond_count(), 6);
        assert!(g.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
        assert!(g.atoms().iter().all(|a| a.hydrogens == 1));
    }

    #[test]
    fn parse_heteroaromatics() {
        assert_eq!(hydrogens("c1ccncc1"), vec![1, 1, 1, 0, 1, 1]);
        assert_eq!(hydrogens("c1ccoc1"), vec![1, 1, 1, 0, 1]);
        assert_eq!(hydrogens("c1cc[nH]c1"), vec![1, 1, 1, 1, 1]);
        assert_eq!(hydrogens("Cn1cccc1")[1], 0);
    }

    #[test]
    fn parse_fused_and_biphenyl() {
        let naphthalene = parse_smiles("c1ccc2ccccc2c1").unwrap();
        assert_eq!(naphthalene.bond_count(), 11);
        let biphenyl = parse_smiles("c1ccccc1-c1ccccc1").unwrap();
        let link = biphenyl.bond_between(5, 6).unwrap();
        assert_eq!(link.order, BondOrder::Single);
    }

    #[test]
    fn parse_branches_and_bond_orders() {
        let g = parse_smiles("CC(=O)Oc1ccccc1C(=O)O").unwrap();
        assert_eq!(g.atom_count(), 13);
        assert_eq!(g.bond_between(1, 2).unwrap().order, BondOrder::Double);
        assert_eq!(g.degree(1), 3);
        assert_eq!(hydrogens("C#N"), vec![1, 0]);
    }

    #[test]
    fn parse_bracket_atoms() {
        let g = parse_smiles("[NH4+]").unwrap();
        assert_eq!(g.atoms()[0].atomic_number, 7);
        assert_eq!(g.atoms()[0].formal_charge, 1);
        assert_eq!(g.atoms()[0].hydrogens, 4);

        let g = parse_smiles("[13CH3][C@@H](O)[O-]").unwrap();
        assert_eq!(g.atoms()[0].isotope, Some(13));
        assert_eq!(g.atoms()[3].formal_charge, -1);

        let g = parse_smiles("[Fe++].[Cl-].[Cl-]").unwrap();
        assert_eq!(g.atoms()[0].formal_charge, 2);
        assert_eq!(g.fragment_count(), 3);

        let g = parse_smiles("[La+3].[Sm].[U].[Ra++]").unwrap();
        let numbers: Vec<u8> = g.atoms().iter().map(|a| a.atomic_number).collect();
        assert_eq!(numbers, vec![57, 62, 92, 88]);
    }

    #[test]
    fn parse_ring_closure_variants() {
        let g = parse_smiles("C%10CCCCCCCCC%10").unwrap();
        assert_eq!(g.bond_count(), 10);
        let g = parse_smiles("C=1CCCCC1").unwrap();
        assert_eq!(g.bond_between(0, 5).unwrap().order, BondOrder::Double);
    }

    #[test]
    fn parse_stereo_markers_are_ignored() {
        let g = parse_smiles("F/C=C/F").unwrap();
        assert_eq!(g.atom_count(), 4);
        assert_eq!(g.bond_between(1, 2).unwrap().order, BondOrder::Double);
    }

    #[test]
    fn rejects_malformed_input() {
        for bad in ["", "   ", "not a molecule!!", "C(", "C)", "C()C", "(C)C", "C1CC", "C=", "C==C", ".C", "C.",
                    "C11", "C12CC12", "[C", "[Xx]", "%1", "Q"]
        {
            assert!(parse_smiles(bad).is_err(), "debería fallar: {bad:?}");
        }
    }

    #[test]
    fn oversized_charges_and_isotopes_are_parse_errors() {
        let many_plus = format!("[C{}]", "+".repeat(130));
        assert!(matches!(parse_smiles(&many_plus), Err(EngineError::Parse { .. })));
        let many_minus = format!("[O{}]", "-".repeat(200));
        assert!(matches!(parse_smiles(&many_minus), Err(EngineError::Parse { .. })));
        assert!(matches!(parse_smiles("[Fe+99]"), Err(EngineError::Parse { .. })));
        assert!(matches!(parse_smiles("[70000C]"), Err(EngineError::Parse { .. })));
        assert!(matches!(parse_smiles("[99999999999999999999C]"), Err(EngineError::Parse { .. })));

        let g = parse_smiles("[Fe+15]").unwrap();
        assert_eq!(g.atoms()[0].formal_charge, 15);
        let g = parse_smiles("[65535C]").unwrap();
        assert_eq!(g.atoms()[0].isotope, Some(65535));
    }

    #[test]
    fn rejects_valence_and_aromaticity_violations() {
        assert!(matches!(parse_smiles("C(C)(C)(C)(C)C"), Err(EngineError::Valence { atom: 0, .. })));
        assert!(matches!(parse_smiles("O=O=O"), Err(EngineError::Valence { .. })));
        assert!(matches!(parse_smiles("c"), Err(EngineError::Aromaticity { atom: 0 })));
        assert!(matches!(parse_smiles("Ccc"), Err(EngineError::Aromaticity { .. })));
    }

    #[test]
    fn empty_input_is_its_own_error() {
        assert_eq!(parse_smiles(" "), Err(EngineError::Empty));
    }
}
