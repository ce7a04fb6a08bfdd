pub mod inventory_controller;
