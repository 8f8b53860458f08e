pub mod middlebox;
pub mod traffic_class;
pub mod traffic_request;

use crate::domain::catalog::middlebox::Middlebox;
use crate::domain::catalog::traffic_class::TrafficClass;
use crate::domain::utils::id::MiddleboxId;

/// Immutable middlebox and traffic-class definitions shared by all requests of a run.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    middleboxes: Vec<Middlebox>,
    traffic_classes: Vec<TrafficClass>,
}

impl Catalog {
    pub fn new(middleboxes: Vec<Middlebox>, traffic_classes: Vec<TrafficClass>) -> Self {
        Self { middleboxes, traffic_classes }
    }

    pub fn middlebox(&self, id: MiddleboxId) -> Option<&Middlebox> {
        self.middleboxes.get(id.index())
    }

    pub fn middleboxes(&self) -> &[Middlebox] {
        &self.middleboxes
    }

    pub fn traffic_class_by_name(&self, name: &str) -> Option<&TrafficClass> {
        self.traffic_classes.iter().find(|class| class.name == name)
    }

    pub fn traffic_classes(&self) -> &[TrafficClass] {
        &self.traffic_classes
    }
}
