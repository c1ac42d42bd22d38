pub mod mock_carrier;
pub mod test_setup;
