//! Drink recipe table.
//!
//! One ordered table of drinks, indexed by [`DrinkId`].  Menu order is
//! table order; everything the menu needs (label, parts) lives in the same
//! row so the table is defined exactly once.

use core::fmt;

use crate::config::MachineConfig;
use crate::error::RecipeError;

/// Number of pumps / ingredient slots on the machine.
pub const INGREDIENT_COUNT: usize = 5;

/// Ingredient slots, in pump order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Ingredient {
    Pineapple = 0,
    /// Pump 1 is plumbed but has no reservoir.
    Spare = 1,
    Orange = 2,
    SodaWater = 3,
    Grenadine = 4,
}

impl Ingredient {
    pub const ALL: [Ingredient; INGREDIENT_COUNT] = [
        Self::Pineapple,
        Self::Spare,
        Self::Orange,
        Self::SodaWater,
        Self::Grenadine,
    ];

    /// Pump index that dispenses this ingredient.
    pub const fn pump(self) -> usize {
        self as usize
    }
}

/// One drink: its menu label and the parts of each ingredient.
///
/// Labels may contain a single `\n`, which moves the LCD cursor to the
/// second row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipe {
    pub name: &'static str,
    pub parts: [u32; INGREDIENT_COUNT],
}

impl Recipe {
    const fn new(name: &'static str, parts: [u32; INGREDIENT_COUNT]) -> Self {
        Self { name, parts }
    }

    pub fn total_parts(&self) -> u32 {
        self.parts.iter().sum()
    }
}

//                                                pineapple
//                                                  |    spare
//                                                  |    |  orange
//                                                  |    |  |    soda
//                                                  |    |  |    |    grenadine
#[rustfmt::skip]
pub const DRINKS: [Recipe; 10] = [
    Recipe::new("Sunrise Splash",              [120, 0, 120, 60,  2]),
    Recipe::new("Tropical Fizz",               [180, 0, 60,  60,  0]),
    Recipe::new("Orange Sparkler",             [0,   0, 240, 60,  2]),
    Recipe::new("Pineapple\nGrenadine Spritz", [180, 0, 0,   120, 3]),
    Recipe::new("Sunset Refresher",            [120, 0, 0,   120, 3]),
    Recipe::new("Citrus Blast",                [30,  0, 120, 120, 0]),
    Recipe::new("Tropical Sunrise",            [120, 0, 60,  120, 3]),
    Recipe::new("ORANGE",                      [0,   0, 150, 0,   0]),
    Recipe::new("PINEAPPLE",                   [150, 0, 0,   0,   0]),
    Recipe::new("priming",                     [30,  0, 30,  30,  30]),
];

/// Number of selectable drinks.
pub const DRINK_COUNT: usize = DRINKS.len();

/// Index of a drink in [`DRINKS`].  Always in `0..DRINK_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DrinkId(u8);

impl DrinkId {
    pub const FIRST: DrinkId = DrinkId(0);
    pub const LAST: DrinkId = DrinkId(DRINK_COUNT as u8 - 1);

    /// `None` if `index` is past the end of the table.
    pub const fn new(index: usize) -> Option<Self> {
        if index < DRINK_COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub fn recipe(self) -> &'static Recipe {
        &DRINKS[self.index()]
    }

    /// Previous drink in menu order, `None` at the top.
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(Self::new)
    }

    /// Next drink in menu order, `None` past the last drink.
    pub fn next(self) -> Option<Self> {
        Self::new(self.index() + 1)
    }
}

impl fmt::Display for DrinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Labels use '\n' for the LCD row break; keep log lines on one line.
        for (i, part) in self.recipe().name.split('\n').enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(part)?;
        }
        Ok(())
    }
}

/// Check every recipe in `table` fits in the glass.
///
/// Run once at startup, before any hardware is touched.  The first
/// offending recipe is reported.
pub fn validate_table(table: &[Recipe], config: &MachineConfig) -> Result<(), RecipeError> {
    for recipe in table {
        let total_parts = recipe.total_parts();
        let volume_ml = total_parts.saturating_mul(config.volume_per_part_ml);
        if volume_ml > config.glass_volume_ml {
            return Err(RecipeError::ExceedsGlass {
                name: recipe.name,
                total_parts,
                volume_ml,
                glass_ml: config.glass_volume_ml,
            });
        }
    }
    Ok(())
}
