pub mod hubspot;

pub use hubspot::create_hubspot_routes;
