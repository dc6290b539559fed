//! Resource model.
//!
//! Resources perform tasks: crews and workers (labor), machines and
//! vehicles (equipment), consumable stock (material). Each resource has
//! skills with proficiency levels, a cost rate and an availability calendar.

use serde::{Deserialize, Serialize};

use super::Calendar;

/// A resource that can be allocated to tasks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    /// Unique resource identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Resource classification.
    pub resource_type: ResourceType,
    /// Capability tags with proficiency levels.
    pub skills: Vec<Skill>,
    /// Safety certifications held.
    pub certifications: Vec<String>,
    /// Cost per hour of full-capacity effort.
    pub cost_per_hour: f64,
    /// Availability calendar.
    pub availability: Calendar,
    /// Usable hours per day. `None` = continuous.
    pub capacity_hours_per_day: Option<f64>,
    /// Years of experience (labor) or service (equipment).
    pub experience_years: f64,
    /// Equipment condition (0.0 = worn out, 1.0 = new). `None` for non-equipment.
    pub condition: Option<f64>,
    /// Historical fraction of assignments that ran late or over budget.
    pub historical_delay_rate: f64,
    /// Whether the resource is local to the site.
    pub is_local: bool,
}

/// Resource type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// People and crews.
    Labor,
    /// Machines, tools, vehicles.
    Equipment,
    /// Consumable stock.
    Material,
}

/// A skill with proficiency level.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Skill {
    /// Skill tag (e.g., "welding", "excavation").
    pub name: String,
    /// Proficiency level (0.0 to 1.0, where 1.0 = expert).
    pub level: f64,
}

impl Skill {
    /// Creates a new skill.
    pub fn new(name: impl Into<String>, level: f64) -> Self {
        Self {
            name: name.into(),
            level: level.clamp(0.0, 1.0),
        }
    }
}

impl Resource {
    /// Creates a new resource.
    pub fn new(id: impl Into<String>, resource_type: ResourceType) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            resource_type,
            skills: Vec::new(),
            certifications: Vec::new(),
            cost_per_hour: 0.0,
            availability: Calendar::always(),
            capacity_hours_per_day: None,
            experience_years: 0.0,
            condition: None,
            historical_delay_rate: 0.0,
            is_local: false,
        }
    }

    /// Creates a labor resource.
    pub fn labor(id: impl Into<String>) -> Self {
        Self::new(id, ResourceType::Labor)
    }

    /// Creates an equipment resource in new condition.
    pub fn equipment(id: impl Into<String>) -> Self {
        let mut r = Self::new(id, ResourceType::Equipment);
        r.condition = Some(1.0);
        r
    }

    /// Creates a material resource.
    pub fn material(id: impl Into<String>) -> Self {
        Self::new(id, ResourceType::Material)
    }

    /// Sets the resource name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Adds a skill.
    pub fn with_skill(mut self, name: impl Into<String>, level: f64) -> Self {
        self.skills.push(Skill::new(name, level));
        self
    }

    /// Adds a certification.
    pub fn with_certification(mut self, cert: impl Into<String>) -> Self {
        self.certifications.push(cert.into());
        self
    }

    /// Sets the hourly cost.
    pub fn with_cost(mut self, cost_per_hour: f64) -> Self {
        self.cost_per_hour = cost_per_hour;
        self
    }

    /// Sets the availability calendar.
    pub fn with_availability(mut self, calendar: Calendar) -> Self {
        self.availability = calendar;
        self
    }

    /// Sets the usable hours per day.
    pub fn with_daily_capacity(mut self, hours: f64) -> Self {
        self.capacity_hours_per_day = Some(hours.clamp(0.0, 24.0));
        self
    }

    /// Sets experience in years.
    pub fn with_experience(mut self, years: f64) -> Self {
        self.experience_years = years.max(0.0);
        self
    }

    /// Sets the equipment condition.
    pub fn with_condition(mut self, condition: f64) -> Self {
        self.condition = Some(condition.clamp(0.0, 1.0));
        self
    }

    /// Sets the historical delay/overrun rate.
    pub fn with_delay_rate(mut self, rate: f64) -> Self {
        self.historical_delay_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Marks the resource as local.
    pub fn local(mut self) -> Self {
        self.is_local = true;
        self
    }

    /// Whether this resource has a given skill with a non-zero level.
    pub fn has_skill(&self, name: &str) -> bool {
        self.skill_level(name) > 0.0
    }

    /// Returns the proficiency level for a skill (0.0 if not found).
    pub fn skill_level(&self, name: &str) -> f64 {
        self.skills
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.level)
            .unwrap_or(0.0)
    }

    /// Whether the resource holds a certification.
    pub fn has_certification(&self, cert: &str) -> bool {
        self.certifications.iter().any(|c| c == cert)
    }

    /// Share of each day the resource can work (0.0..=1.0).
    pub fn daily_share(&self) -> f64 {
        self.capacity_hours_per_day
            .map(|h| (h / 24.0).clamp(0.0, 1.0))
            .unwrap_or(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_builder() {
        let r = Resource::labor("R1")
            .with_name("Welding crew")
            .with_skill("welding", 0.9)
            .with_skill("rigging", 0.4)
            .with_certification("hot-work")
            .with_cost(85.0)
            .with_experience(6.0)
            .with_delay_rate(0.1)
            .local();

        assert_eq!(r.resource_type, ResourceType::Labor);
        assert!(r.has_skill("welding"));
        assert!(!r.has_skill("excavation"));
        assert!((r.skill_level("welding") - 0.9).abs() < 1e-10);
        assert!(r.has_certification("hot-work"));
        assert!(r.is_local);
        assert_eq!(r.condition, None);
    }

    #[test]
    fn test_zero_level_is_not_a_skill() {
        let r = Resource::labor("R1").with_skill("welding", -0.5);
        assert!(!r.has_skill("welding"));
    }

    #[test]
    fn test_equipment_defaults() {
        let r = Resource::equipment("X1").with_condition(0.7);
        assert_eq!(r.resource_type, ResourceType::Equipment);
        assert_eq!(r.condition, Some(0.7));
    }

    #[test]
    fn test_daily_share() {
        assert!((Resource::labor("R").daily_share() - 1.0).abs() < 1e-10);
        let r = Resource::labor("R").with_daily_capacity(8.0);
        assert!((r.daily_share() - 1.0 / 3.0).abs() < 1e-10);
    }
}
