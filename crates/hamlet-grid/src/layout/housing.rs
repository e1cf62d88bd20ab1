use serde::{Deserialize, Serialize};

use crate::core::{Grid, HouseKind, Tile};

/// Build cost, sale price and demand weight of one house type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HousePrice {
    pub cost: u64,
    pub sale: u64,
    pub weight: f32,
}

impl HousePrice {
    #[must_use]
    pub const fn new(cost: u64, sale: u64, weight: f32) -> Self {
        Self { cost, sale, weight }
    }

    #[expect(clippy::cast_possible_wrap)]
    #[must_use]
    pub const fn profit(&self) -> i64 {
        self.sale as i64 - self.cost as i64
    }
}

/// Price table for the four house types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HousePricing {
    pub h1: HousePrice,
    pub h2: HousePrice,
    pub h3: HousePrice,
    pub h4: HousePrice,
}

impl Default for HousePricing {
    fn default() -> Self {
        Self {
            h1: HousePrice::new(2_000_000, 2_800_000, 1.0),
            h2: HousePrice::new(1_800_000, 2_500_000, 1.0),
            h3: HousePrice::new(2_200_000, 2_900_000, 1.1),
            h4: HousePrice::new(2_500_000, 3_200_000, 0.9),
        }
    }
}

impl HousePricing {
    #[must_use]
    pub fn price(&self, kind: HouseKind) -> &HousePrice {
        match kind {
            HouseKind::H1 => &self.h1,
            HouseKind::H2 => &self.h2,
            HouseKind::H3 => &self.h3,
            HouseKind::H4 => &self.h4,
        }
    }

    /// Share of houses each type should get: weighted profit over the total.
    ///
    /// Loss-making types get no share. If no type is profitable, the shares
    /// are equal.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn ratios(&self) -> [f32; HouseKind::LEN] {
        let weighted = HouseKind::ALL.map(|kind| {
            let price = self.price(kind);
            price.profit().max(0) as f32 * price.weight
        });
        let total = weighted.iter().sum::<f32>();
        if total <= 0.0 {
            return [1.0 / HouseKind::LEN as f32; HouseKind::LEN];
        }
        weighted.map(|w| w / total)
    }

    /// Number of houses of each type for `houses` houses in total.
    ///
    /// Each type gets `floor(ratio * houses)`; the remainder is handed out one
    /// at a time from H1 to H4, wrapping around.
    ///
    /// ```
    /// use hamlet_grid::HousePricing;
    ///
    /// let counts = HousePricing::default().counts(10);
    /// assert_eq!(counts, [3, 3, 2, 2]);
    /// ```
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    #[must_use]
    pub fn counts(&self, houses: usize) -> [usize; HouseKind::LEN] {
        let mut counts = self
            .ratios()
            .map(|ratio| (ratio * houses as f32).floor() as usize);
        let mut assigned = counts.iter().sum::<usize>();
        for i in (0..HouseKind::LEN).cycle() {
            if assigned >= houses {
                break;
            }
            counts[i] += 1;
            assigned += 1;
        }
        counts
    }
}

/// Replaces every house on the grid with a typed house.
///
/// Houses are visited in row-major order and filled with H1 first, then H2,
/// and so on, according to [`HousePricing::counts`]. Returns the counts.
pub fn assign_house_types(grid: &mut Grid, pricing: &HousePricing) -> [usize; HouseKind::LEN] {
    let houses = grid.positions_of(Tile::House).collect::<Vec<_>>();
    let counts = pricing.counts(houses.len());
    let kinds = HouseKind::ALL
        .iter()
        .zip(counts)
        .flat_map(|(&kind, n)| std::iter::repeat_n(kind, n));
    for (pos, kind) in houses.into_iter().zip(kinds) {
        grid.set(pos, Tile::HouseType(kind));
    }
    counts
}

/// Totals of a layout whose houses have types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitSummary {
    /// Typed houses per type, H1 first.
    pub houses: [usize; HouseKind::LEN],
    /// Generic houses that have no type yet and are not priced.
    pub untyped_houses: usize,
    pub total_cost: u64,
    pub total_sale: u64,
    pub profit: i64,
}

impl ProfitSummary {
    #[must_use]
    pub fn from_grid(grid: &Grid, pricing: &HousePricing) -> Self {
        let mut summary = Self::default();
        for (_, tile) in grid.iter() {
            match tile {
                Tile::HouseType(kind) => {
                    let price = pricing.price(kind);
                    summary.houses[kind.index()] += 1;
                    summary.total_cost += price.cost;
                    summary.total_sale += price.sale;
                    summary.profit += price.profit();
                }
                Tile::House => summary.untyped_houses += 1,
                _ => {}
            }
        }
        summary
    }
}
