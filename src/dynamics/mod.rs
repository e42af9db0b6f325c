pub mod ideal;

pub use ideal::{fuel_burn_rate, geodetic_rates, wind_axes_rates};
