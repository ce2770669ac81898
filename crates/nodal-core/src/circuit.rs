//! The element container mutated by commands and read by analyses.

use std::collections::{BTreeSet, HashMap};

use crate::element::{Element, ElementKind};
use crate::error::{Error, Result};
use crate::registry::{GROUND, NodeRegistry};

/// An ordered collection of elements plus the node registry they reference.
///
/// Mutated between analyses; the engines canonicalize node ids and lay out
/// the unknown vector before reading it.
#[derive(Debug, Clone, Default)]
pub struct Circuit {
    elements: Vec<Element>,
    registry: NodeRegistry,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut NodeRegistry {
        &mut self.registry
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut [Element] {
        &mut self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Append an element, rejecting duplicate names.
    pub fn add_element(&mut self, element: Element) -> Result<()> {
        if self.find_element(&element.name).is_some() {
            return Err(Error::DuplicateName(element.name));
        }
        self.elements.push(element);
        Ok(())
    }

    /// Remove an element by name. Returns whether anything was removed.
    pub fn remove_element_by_name(&mut self, name: &str) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.name != name);
        self.elements.len() != before
    }

    pub fn find_element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    pub fn find_element_mut(&mut self, name: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.name == name)
    }

    /// Rewrite every endpoint (and controlling endpoint) to its union-find
    /// representative. A no-op on an already-canonical circuit.
    pub fn canonicalize_nodes(&mut self) {
        let registry = &mut self.registry;
        for element in &mut self.elements {
            element.node_pos = registry.canonical(element.node_pos);
            element.node_neg = registry.canonical(element.node_neg);
            match &mut element.kind {
                ElementKind::Vccs { ctrl_pos, ctrl_neg }
                | ElementKind::Vcvs { ctrl_pos, ctrl_neg } => {
                    *ctrl_pos = registry.canonical(*ctrl_pos);
                    *ctrl_neg = registry.canonical(*ctrl_neg);
                }
                _ => {}
            }
        }
    }

    /// Every node id referenced by an element (endpoints and controlling
    /// nodes), canonicalized.
    pub fn referenced_nodes(&self) -> BTreeSet<u32> {
        let mut nodes = BTreeSet::new();
        for element in &self.elements {
            nodes.insert(self.registry.find(element.node_pos));
            nodes.insert(self.registry.find(element.node_neg));
            match &element.kind {
                ElementKind::Vccs { ctrl_pos, ctrl_neg }
                | ElementKind::Vcvs { ctrl_pos, ctrl_neg } => {
                    nodes.insert(self.registry.find(*ctrl_pos));
                    nodes.insert(self.registry.find(*ctrl_neg));
                }
                _ => {}
            }
        }
        nodes
    }

    /// DFS from ground over the undirected multigraph of element endpoints:
    /// true iff every referenced node is reachable from ground.
    pub fn is_connected(&self) -> bool {
        if self.elements.is_empty() {
            return true;
        }

        let mut adjacency: HashMap<u32, Vec<u32>> = HashMap::new();
        for element in &self.elements {
            let a = self.registry.find(element.node_pos);
            let b = self.registry.find(element.node_neg);
            adjacency.entry(a).or_default().push(b);
            adjacency.entry(b).or_default().push(a);
        }

        let mut visited = BTreeSet::new();
        let mut stack = vec![GROUND];
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            if let Some(neighbors) = adjacency.get(&node) {
                stack.extend(neighbors.iter().copied());
            }
        }

        self.referenced_nodes().iter().all(|n| visited.contains(n))
    }

    /// Refresh the cached instantaneous value of every time-varying source.
    pub fn update_time_dependent_sources(&mut self, t: f64) {
        for element in &mut self.elements {
            match &element.kind {
                ElementKind::Sinusoid(params) => element.value = params.value_at(t),
                ElementKind::Pulse(params) => element.value = params.value_at(t),
                _ => {}
            }
        }
    }

    /// Whether any element requires Newton iteration.
    pub fn has_nonlinear(&self) -> bool {
        self.elements.iter().any(Element::is_nonlinear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::SinusoidParams;

    fn rc_circuit() -> Circuit {
        let mut circuit = Circuit::new();
        let n1 = circuit.registry_mut().resolve("n1").unwrap();
        let n2 = circuit.registry_mut().resolve("n2").unwrap();
        circuit
            .add_element(Element::voltage_source("V1", n1, GROUND, 1.0))
            .unwrap();
        circuit
            .add_element(Element::resistor("R1", n1, n2, 1e3))
            .unwrap();
        circuit
            .add_element(Element::capacitor("C1", n2, GROUND, 1e-6))
            .unwrap();
        circuit
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut circuit = rc_circuit();
        let err = circuit
            .add_element(Element::resistor("R1", 1, 0, 50.0))
            .unwrap_err();
        assert_eq!(err, Error::DuplicateName("R1".to_string()));
        assert_eq!(circuit.len(), 3);
    }

    #[test]
    fn test_remove_element() {
        let mut circuit = rc_circuit();
        assert!(circuit.remove_element_by_name("R1"));
        assert!(!circuit.remove_element_by_name("R1"));
        assert!(circuit.find_element("R1").is_none());
    }

    #[test]
    fn test_canonicalize_after_short() {
        let mut circuit = rc_circuit();
        circuit.registry_mut().connect("n1", "n2").unwrap();
        circuit.canonicalize_nodes();

        let r1 = circuit.find_element("R1").unwrap();
        assert_eq!(r1.node_pos, r1.node_neg, "shorted endpoints should merge");

        // Canonicalizing again changes nothing
        let snapshot: Vec<(u32, u32)> = circuit
            .elements()
            .iter()
            .map(|e| (e.node_pos, e.node_neg))
            .collect();
        circuit.canonicalize_nodes();
        let again: Vec<(u32, u32)> = circuit
            .elements()
            .iter()
            .map(|e| (e.node_pos, e.node_neg))
            .collect();
        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_connectivity() {
        let mut circuit = rc_circuit();
        assert!(circuit.is_connected());

        // A resistor floating between two fresh nodes is unreachable
        let a = circuit.registry_mut().resolve("float_a").unwrap();
        let b = circuit.registry_mut().resolve("float_b").unwrap();
        circuit
            .add_element(Element::resistor("R9", a, b, 10.0))
            .unwrap();
        assert!(!circuit.is_connected());
    }

    #[test]
    fn test_empty_circuit_is_connected() {
        assert!(Circuit::new().is_connected());
    }

    #[test]
    fn test_time_dependent_source_refresh() {
        let mut circuit = Circuit::new();
        let n1 = circuit.registry_mut().resolve("n1").unwrap();
        circuit
            .add_element(Element::sinusoid(
                "S1",
                n1,
                GROUND,
                SinusoidParams {
                    offset: 0.0,
                    amplitude: 1.0,
                    frequency: 1.0,
                    phase: 0.0,
                },
            ))
            .unwrap();

        circuit.update_time_dependent_sources(0.25);
        let s1 = circuit.find_element("S1").unwrap();
        assert!((s1.value - 1.0).abs() < 1e-12, "sin peaks at quarter period");
    }
}
