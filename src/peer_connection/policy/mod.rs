pub mod ice_transport_policy;
