// Static per-category advice, used when no LLM is configured or the
// AI path yields nothing usable.

use crate::rules::ThreatLevel;

const CRIME: &[&str] = &[
    "Stay in well-lit, populated areas and avoid isolated locations",
    "Keep valuables secure and out of sight, use bags with zippers",
    "Be aware of your surroundings and trust your instincts about suspicious behavior",
    "Share your location with trusted contacts when traveling alone",
];

const NATURAL: &[&str] = &[
    "Stay informed about weather conditions through official meteorological sources",
    "Prepare an emergency kit with water, food, medications, and important documents",
    "Know your evacuation routes and identify safe shelters in your area",
    "Follow official emergency guidelines and evacuation orders without delay",
];

const TRAFFIC: &[&str] = &[
    "Drive defensively and maintain safe following distances in all conditions",
    "Avoid using mobile devices while driving and stay focused on the road",
    "Check traffic conditions and road closures before starting your journey",
    "Use alternative routes during peak hours or when accidents are reported",
];

const VIOLENCE: &[&str] = &[
    "Avoid large gatherings, protests, or areas with visible tension",
    "Stay indoors if advised by authorities and keep doors and windows secured",
    "Keep emergency contact numbers readily available and phone charged",
    "Monitor reliable local news sources for updates and safety advisories",
];

const FIRE: &[&str] = &[
    "Know the locations of all fire exits in buildings you frequent",
    "Install and regularly test smoke detectors in your home",
    "Develop and practice a fire escape plan with all household members",
    "Never use elevators during fire emergencies, always use stairs",
];

const MEDICAL: &[&str] = &[
    "Follow guidelines from official health authorities and medical professionals",
    "Maintain proper hygiene practices and wash hands frequently with soap",
    "Seek immediate medical attention if you experience concerning symptoms",
    "Stay informed about health advisories and vaccination recommendations",
];

const AVIATION: &[&str] = &[
    "Pay attention to all pre-flight safety demonstrations and instructions",
    "Keep yourself informed about airline safety records and improvements",
    "Report any suspicious activities or unattended items at airports immediately",
    "Remain calm and follow flight crew instructions during any emergency situations",
];

const DEFAULT: &[&str] = &[
    "Stay alert and informed about local conditions through official sources",
    "Follow all official safety guidelines and emergency protocols",
    "Keep emergency contact numbers and important documents accessible",
    "Trust verified official sources for accurate and timely information",
];

fn category_advice(category: &str) -> &'static [&'static str] {
    match category {
        "crime" => CRIME,
        "natural" => NATURAL,
        "traffic" => TRAFFIC,
        "violence" => VIOLENCE,
        "fire" => FIRE,
        "medical" => MEDICAL,
        "aviation" => AVIATION,
        _ => DEFAULT,
    }
}

/// Pick advice from the category table, varied by threat level so the
/// same category does not always read identically. Always at most 3
/// items; a city line fills the last slot when there is room.
pub fn static_advice(category: &str, level: ThreatLevel, city: Option<&str>) -> Vec<String> {
    let base = category_advice(category);

    let mut selected: Vec<String> = match level {
        ThreatLevel::High => base.iter().take(3).map(|s| s.to_string()).collect(),
        ThreatLevel::Medium => {
            let mut items = vec![base[0].to_string()];
            if base.len() > 2 {
                items.push(base[2].to_string());
            }
            if base.len() > 3 {
                items.push(base[3].to_string());
            }
            items
        }
        ThreatLevel::Low => {
            if base.len() > 1 {
                base[1..].iter().map(|s| s.to_string()).collect()
            } else {
                base.iter().map(|s| s.to_string()).collect()
            }
        }
    };

    if let Some(city) = city {
        if selected.len() < 3 {
            selected.push(format!(
                "Contact local {city} emergency services for area-specific assistance"
            ));
        }
    }

    selected.truncate(3);
    selected
}
