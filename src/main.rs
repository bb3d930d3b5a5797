fn main() {
    device_compare_lib::run()
}
