fn main() {
    chartsmith_lib::run()
}
