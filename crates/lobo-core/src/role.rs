//! Roles and their static descriptions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A role dealt to a player at the start of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Aldeano,
    Lobo,
    Vidente,
    Bruja,
    Cazador,
    Alguacil,
    #[serde(rename = "Niña")]
    Nina,
}

/// Every role, in the order the role picker lists them.
pub const ALL_ROLES: &[Role] = &[
    Role::Aldeano,
    Role::Lobo,
    Role::Vidente,
    Role::Bruja,
    Role::Cazador,
    Role::Alguacil,
    Role::Nina,
];

/// Display data for a role card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleInfo {
    pub display_name: &'static str,
    pub ability_text: &'static str,
    pub reminder_text: &'static str,
    /// Asset key of the role icon.
    pub icon: &'static str,
}

/// Shown when no role has been assigned or the server sent one we don't know.
pub const UNKNOWN_ROLE: RoleInfo = RoleInfo {
    display_name: "DESCONOCIDO",
    ability_text: "Tu rol todavía no ha sido revelado.",
    reminder_text: "Espera a que el narrador reparta los roles.",
    icon: "icon_desconocido",
};

impl Role {
    /// Parse a role name as the server sends it. Case and surrounding
    /// whitespace are ignored, and a few common spellings are accepted.
    pub fn parse(name: &str) -> Option<Role> {
        let name = name.trim().to_lowercase();
        let role = match name.as_str() {
            "aldeano" | "aldeana" => Role::Aldeano,
            "lobo" | "hombre lobo" | "lobo feroz" => Role::Lobo,
            "vidente" => Role::Vidente,
            "bruja" => Role::Bruja,
            "cazador" => Role::Cazador,
            "alguacil" | "sheriff" => Role::Alguacil,
            "niña" | "nina" => Role::Nina,
            _ => return None,
        };
        Some(role)
    }

    /// Static card data for this role.
    pub fn info(self) -> RoleInfo {
        match self {
            Role::Aldeano => RoleInfo {
                display_name: "ALDEANO",
                ability_text: "No tienes poderes especiales. Descubre a los lobos y vota para eliminarlos.",
                reminder_text: "Escucha con atención durante el día.",
                icon: "icon_aldeano",
            },
            Role::Lobo => RoleInfo {
                display_name: "LOBO",
                ability_text: "Cada noche, junto a la manada, eliges a un aldeano para devorarlo.",
                reminder_text: "De día, finge ser un aldeano más.",
                icon: "icon_lobo",
            },
            Role::Vidente => RoleInfo {
                display_name: "VIDENTE",
                ability_text: "Cada noche puedes descubrir el rol de un jugador.",
                reminder_text: "Comparte lo que sabes sin delatarte.",
                icon: "icon_vidente",
            },
            Role::Bruja => RoleInfo {
                display_name: "BRUJA",
                ability_text: "Tienes una poción para salvar a la víctima de los lobos y otra para eliminar a un jugador.",
                reminder_text: "Cada poción solo puede usarse una vez por partida.",
                icon: "icon_bruja",
            },
            Role::Cazador => RoleInfo {
                display_name: "CAZADOR",
                ability_text: "Si mueres, disparas tu último cartucho contra el jugador que elijas.",
                reminder_text: "Piensa bien a quién apuntas.",
                icon: "icon_cazador",
            },
            Role::Alguacil => RoleInfo {
                display_name: "ALGUACIL",
                ability_text: "Tu voto cuenta doble durante el día.",
                reminder_text: "Si mueres, eliges a tu sucesor.",
                icon: "icon_alguacil",
            },
            Role::Nina => RoleInfo {
                display_name: "NIÑA",
                ability_text: "Puedes espiar a los lobos por la noche, pero si te descubren morirás.",
                reminder_text: "No te dejes ver.",
                icon: "icon_nina",
            },
        }
    }

    /// Whether the role belongs to the wolf side.
    pub fn is_wolf(self) -> bool {
        matches!(self, Role::Lobo)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().display_name)
    }
}

/// Describe a role given its wire name, falling back to [`UNKNOWN_ROLE`]
/// for unassigned or unrecognised values. Never fails.
pub fn describe_role(name: Option<&str>) -> RoleInfo {
    name.and_then(Role::parse)
        .map(Role::info)
        .unwrap_or(UNKNOWN_ROLE)
}
