mod controller;
mod fake_api;
