//! crates/gramseva_core/src/catalog.rs
//!
//! The closed set of top-level service categories and the sub-services each
//! one offers. `specific_services` on a provider record is *not* checked
//! against this catalog server-side; it is exposed so clients can render and
//! constrain their own pickers.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCategory {
    HomeRepair,
    Agriculture,
    Healthcare,
    Transport,
    EventServices,
    ProfessionalHelp,
    Construction,
    Education,
    BeautyPersonal,
    SecurityInstallation,
    DailyEssentials,
    DigitalServices,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 12] = [
        ServiceCategory::HomeRepair,
        ServiceCategory::Agriculture,
        ServiceCategory::Healthcare,
        ServiceCategory::Transport,
        ServiceCategory::EventServices,
        ServiceCategory::ProfessionalHelp,
        ServiceCategory::Construction,
        ServiceCategory::Education,
        ServiceCategory::BeautyPersonal,
        ServiceCategory::SecurityInstallation,
        ServiceCategory::DailyEssentials,
        ServiceCategory::DigitalServices,
    ];

    /// The wire/storage value for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::HomeRepair => "home_repair",
            ServiceCategory::Agriculture => "agriculture",
            ServiceCategory::Healthcare => "healthcare",
            ServiceCategory::Transport => "transport",
            ServiceCategory::EventServices => "event_services",
            ServiceCategory::ProfessionalHelp => "professional_help",
            ServiceCategory::Construction => "construction",
            ServiceCategory::Education => "education",
            ServiceCategory::BeautyPersonal => "beauty_personal",
            ServiceCategory::SecurityInstallation => "security_installation",
            ServiceCategory::DailyEssentials => "daily_essentials",
            ServiceCategory::DigitalServices => "digital_services",
        }
    }

    /// Human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceCategory::HomeRepair => "Home Repair & Maintenance",
            ServiceCategory::Agriculture => "Agriculture Essentials",
            ServiceCategory::Healthcare => "Healthcare",
            ServiceCategory::Transport => "Transport",
            ServiceCategory::EventServices => "Event Services",
            ServiceCategory::ProfessionalHelp => "Professional Help",
            ServiceCategory::Construction => "Construction",
            ServiceCategory::Education => "Education",
            ServiceCategory::BeautyPersonal => "Beauty & Personal",
            ServiceCategory::SecurityInstallation => "Security & Installation",
            ServiceCategory::DailyEssentials => "Daily Essentials",
            ServiceCategory::DigitalServices => "Digital Services",
        }
    }

    /// The sub-services offered under this category.
    pub fn services(&self) -> &'static [&'static str] {
        match self {
            ServiceCategory::HomeRepair => &[
                "Electrician",
                "Plumber",
                "Carpenter",
                "Mason/Mistri",
                "Mobile/appliance repair",
            ],
            ServiceCategory::Agriculture => &[
                "Tractor rental (with driver)",
                "Harvesting equipment rental",
                "Spraying/pesticide services",
                "Farm labor booking",
                "Soil testing",
            ],
            ServiceCategory::Healthcare => &[
                "Doctor home visits",
                "Ambulance booking",
                "Medicine delivery",
                "Lab sample collection",
                "Veterinary services (for livestock)",
            ],
            ServiceCategory::Transport => &[
                "Goods vehicle/tempo",
                "Bike taxi/auto",
                "Tractor trolley for goods",
                "Marriage/event transport",
            ],
            ServiceCategory::EventServices => &[
                "DJ & sound system",
                "Caterers",
                "Tent/decoration",
                "Photographer",
                "Priest/Pandit",
            ],
            ServiceCategory::ProfessionalHelp => &[
                "Government documentation (Aadhaar, PAN, schemes)",
                "Accountant/tax filing",
                "Insurance agents",
                "Lawyer consultation",
            ],
            ServiceCategory::Construction => &[
                "JCB/excavator rental",
                "Building contractors",
                "Sand/cement suppliers",
            ],
            ServiceCategory::Education => &[
                "Home tutors",
                "Computer training",
                "Competitive exam coaching",
            ],
            ServiceCategory::BeautyPersonal => {
                &["Salon at home", "Bridal makeup", "Mehendi artist"]
            }
            ServiceCategory::SecurityInstallation => {
                &["CCTV installation", "Solar panel setup", "Security guard"]
            }
            ServiceCategory::DailyEssentials => &[
                "LPG cylinder delivery",
                "Water can delivery",
                "Grocery delivery",
            ],
            ServiceCategory::DigitalServices => &[
                "Mobile/DTH recharge",
                "Internet/WiFi setup",
                "Computer repair",
            ],
        }
    }
}

impl std::str::FromStr for ServiceCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown service category: {s}"))
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
